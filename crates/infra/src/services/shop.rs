//! The tenant's shop profile (one document per tenant).

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use invoicefy_core::{DomainError, ExpectedVersion, TenantId};
use invoicefy_parties::{ShopProfile, ShopProfileDetails};

use crate::store::repository::shop_profile_id;
use crate::store::{DocumentStore, Repository};

use super::ServiceResult;

#[derive(Clone)]
pub struct ShopService {
    repo: Repository<ShopProfile>,
}

impl ShopService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn get(&self, tenant_id: TenantId) -> ServiceResult<ShopProfile> {
        self.repo
            .get(tenant_id, shop_profile_id(tenant_id))
            .await?
            .ok_or_else(|| DomainError::NotFound.into())
    }

    /// Initial profile written at registration.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn create(&self, tenant_id: TenantId, shop_name: &str) -> ServiceResult<ShopProfile> {
        let profile = ShopProfile::new(tenant_id, shop_name, Utc::now())?;
        Ok(self.repo.insert(&profile).await?)
    }

    /// Replace the profile, creating it when the tenant has none yet.
    #[instrument(skip(self, details), fields(tenant_id = %tenant_id))]
    pub async fn update(&self, tenant_id: TenantId, details: ShopProfileDetails) -> ServiceResult<ShopProfile> {
        let now = Utc::now();
        let existing = self.repo.get(tenant_id, shop_profile_id(tenant_id)).await?;
        let stored = match existing {
            Some(mut profile) => {
                profile.update(details, now)?;
                self.repo.replace(&profile, ExpectedVersion::Any).await?
            }
            None => {
                let mut profile = ShopProfile::new(tenant_id, &details.shop_name, now)?;
                profile.update(details, now)?;
                self.repo.insert(&profile).await?
            }
        };
        tracing::info!("shop profile updated");
        Ok(stored)
    }

    /// Undo a profile created by a registration that failed later on.
    pub(crate) async fn remove(&self, tenant_id: TenantId) -> ServiceResult<()> {
        self.repo.delete(tenant_id, shop_profile_id(tenant_id)).await?;
        Ok(())
    }
}

//! Customers and products: flat records with whole-record updates.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use invoicefy_core::{AggregateId, AggregateRoot, DomainError, ExpectedVersion, TenantId};
use invoicefy_parties::{Customer, CustomerDetails, CustomerId};
use invoicefy_products::{Product, ProductDetails, ProductId};

use crate::store::{DocumentStore, Repository};

use super::ServiceResult;

#[derive(Clone)]
pub struct CustomerService {
    repo: Repository<Customer>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn list(&self, tenant_id: TenantId) -> ServiceResult<Vec<Customer>> {
        Ok(self.repo.list(tenant_id).await?)
    }

    /// Lookup used by invoice validation; `None` for unknown ids and for
    /// customers of other tenants.
    pub async fn find(&self, tenant_id: TenantId, id: CustomerId) -> ServiceResult<Option<Customer>> {
        Ok(self.repo.get(tenant_id, id.0).await?)
    }

    pub async fn get(&self, tenant_id: TenantId, id: CustomerId) -> ServiceResult<Customer> {
        self.find(tenant_id, id).await?.ok_or(DomainError::NotFound.into())
    }

    #[instrument(skip(self, details), fields(tenant_id = %tenant_id))]
    pub async fn create(&self, tenant_id: TenantId, details: CustomerDetails) -> ServiceResult<Customer> {
        let customer = Customer::register(tenant_id, CustomerId::new(AggregateId::new()), details, Utc::now())?;
        let stored = self.repo.insert(&customer).await?;
        tracing::info!(customer_id = %stored.id_typed(), "customer created");
        Ok(stored)
    }

    #[instrument(skip(self, details), fields(tenant_id = %tenant_id, customer_id = %id))]
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
        details: CustomerDetails,
        expected: ExpectedVersion,
    ) -> ServiceResult<Customer> {
        let mut customer = self.get(tenant_id, id).await?;
        customer.update(details, Utc::now())?;
        let stored = self.repo.replace(&customer, expected).await?;
        tracing::info!(version = stored.version(), "customer updated");
        Ok(stored)
    }

    /// Hard delete. Invoices keep their customer snapshot.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, customer_id = %id))]
    pub async fn delete(&self, tenant_id: TenantId, id: CustomerId) -> ServiceResult<()> {
        if !self.repo.delete(tenant_id, id.0).await? {
            return Err(DomainError::NotFound.into());
        }
        tracing::info!("customer deleted");
        Ok(())
    }
}

#[derive(Clone)]
pub struct ProductService {
    repo: Repository<Product>,
}

impl ProductService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn list(&self, tenant_id: TenantId) -> ServiceResult<Vec<Product>> {
        Ok(self.repo.list(tenant_id).await?)
    }

    pub async fn find(&self, tenant_id: TenantId, id: ProductId) -> ServiceResult<Option<Product>> {
        Ok(self.repo.get(tenant_id, id.0).await?)
    }

    pub async fn get(&self, tenant_id: TenantId, id: ProductId) -> ServiceResult<Product> {
        self.find(tenant_id, id).await?.ok_or(DomainError::NotFound.into())
    }

    #[instrument(skip(self, details), fields(tenant_id = %tenant_id))]
    pub async fn create(&self, tenant_id: TenantId, details: ProductDetails) -> ServiceResult<Product> {
        let product = Product::create(tenant_id, ProductId::new(AggregateId::new()), details, Utc::now())?;
        let stored = self.repo.insert(&product).await?;
        tracing::info!(product_id = %stored.id_typed(), "product created");
        Ok(stored)
    }

    /// Existing invoice lines keep the price they were saved with.
    #[instrument(skip(self, details), fields(tenant_id = %tenant_id, product_id = %id))]
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: ProductId,
        details: ProductDetails,
        expected: ExpectedVersion,
    ) -> ServiceResult<Product> {
        let mut product = self.get(tenant_id, id).await?;
        product.update(details, Utc::now())?;
        let stored = self.repo.replace(&product, expected).await?;
        tracing::info!(version = stored.version(), "product updated");
        Ok(stored)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, product_id = %id))]
    pub async fn delete(&self, tenant_id: TenantId, id: ProductId) -> ServiceResult<()> {
        if !self.repo.delete(tenant_id, id.0).await? {
            return Err(DomainError::NotFound.into());
        }
        tracing::info!("product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use crate::store::InMemoryDocumentStore;
    use rust_decimal::Decimal;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    fn named(name: &str) -> CustomerDetails {
        CustomerDetails {
            name: name.to_string(),
            ..CustomerDetails::default()
        }
    }

    #[tokio::test]
    async fn customer_crud_is_tenant_scoped() {
        let service = CustomerService::new(store());
        let tenant = TenantId::new();
        let other = TenantId::new();

        let created = service.create(tenant, named("Acme")).await.unwrap();
        assert_eq!(created.version(), 1);

        assert!(service.find(other, created.id_typed()).await.unwrap().is_none());
        assert!(matches!(
            service.delete(other, created.id_typed()).await,
            Err(ServiceError::Domain(DomainError::NotFound))
        ));

        let updated = service
            .update(tenant, created.id_typed(), named("Acme Ltd"), ExpectedVersion::Any)
            .await
            .unwrap();
        assert_eq!(updated.name(), "Acme Ltd");
        assert_eq!(updated.version(), 2);

        service.delete(tenant, created.id_typed()).await.unwrap();
        assert!(service.list(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_customer_update_conflicts() {
        let service = CustomerService::new(store());
        let tenant = TenantId::new();
        let created = service.create(tenant, named("Acme")).await.unwrap();
        service
            .update(tenant, created.id_typed(), named("Acme 2"), ExpectedVersion::Exact(1))
            .await
            .unwrap();

        let err = service
            .update(tenant, created.id_typed(), named("Acme 3"), ExpectedVersion::Exact(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn blank_customer_name_is_rejected_before_storage() {
        let service = CustomerService::new(store());
        let tenant = TenantId::new();
        let err = service.create(tenant, named(" ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(service.list(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn product_update_keeps_two_decimal_price() {
        let service = ProductService::new(store());
        let tenant = TenantId::new();
        let created = service
            .create(
                tenant,
                ProductDetails {
                    name: "Bolt".into(),
                    description: None,
                    price: Decimal::new(25, 1),
                    unit: None,
                    sku: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.price().to_string(), "2.50");

        let missing = service.get(tenant, ProductId::new(AggregateId::new())).await;
        assert!(matches!(missing, Err(ServiceError::Domain(DomainError::NotFound))));
    }
}

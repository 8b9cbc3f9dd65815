use serde::{Deserialize, Serialize};

use invoicefy_core::TenantId;

/// A principal's membership in a tenant: which tenant it acts within and the
/// roles/permissions granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<crate::Role>,
    pub permissions: Vec<crate::Permission>,
}

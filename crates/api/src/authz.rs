//! API-side authorization guard for writes.
//!
//! Enforced at the handler boundary, before a service is called, so the
//! domain crates and services stay auth-agnostic.

use invoicefy_auth::{AuthzError, CommandAuthorization, Permission, Principal, Role, TenantMembership, authorize};

use crate::context::{PrincipalContext, TenantContext};

/// Check authorization for a write in the current request context.
pub fn authorize_command<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let membership = TenantMembership {
        tenant_id: tenant.tenant_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_tenant_id: tenant.tenant_id(),
        membership,
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    roles.iter().flat_map(Role::permissions).collect()
}

use axum::http::StatusCode;

use invoicefy_auth::{CommandAuthorization, Permission};

use crate::app::errors;
use crate::context::{PrincipalContext, TenantContext};

/// Small helper wrapper to associate required permissions with a write.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

impl<C> CmdAuth<C> {
    pub fn new(inner: C, required: Permission) -> Self {
        Self {
            inner,
            required: vec![required],
        }
    }

    /// Unwrap the payload if the principal holds every required permission.
    pub fn authorize(
        self,
        tenant: &TenantContext,
        principal: &PrincipalContext,
    ) -> Result<C, axum::response::Response> {
        if let Err(e) = crate::authz::authorize_command(tenant, principal, &self) {
            tracing::debug!(error = %e, "write rejected by authorization");
            return Err(errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()));
        }
        Ok(self.inner)
    }
}

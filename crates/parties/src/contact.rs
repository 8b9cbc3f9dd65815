use serde::{Deserialize, Serialize};

use invoicefy_core::error::optional_text;

/// Postal and contact details shared by customers and the shop profile.
///
/// Every field is optional; blank strings are normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ContactInfo {
    pub fn normalized(self) -> Self {
        Self {
            email: optional_text(self.email).map(|e| e.to_lowercase()),
            phone: optional_text(self.phone),
            address: optional_text(self.address),
            city: optional_text(self.city),
            state: optional_text(self.state),
            zip_code: optional_text(self.zip_code),
            country: optional_text(self.country),
        }
    }

    /// Single-line postal address ("12 Main St, Springfield, IL 62701, US").
    pub fn postal_line(&self) -> Option<String> {
        let region = match (&self.state, &self.zip_code) {
            (Some(s), Some(z)) => Some(format!("{s} {z}")),
            (Some(s), None) => Some(s.clone()),
            (None, Some(z)) => Some(z.clone()),
            (None, None) => None,
        };

        let parts: Vec<String> = [self.address.clone(), self.city.clone(), region, self.country.clone()]
            .into_iter()
            .flatten()
            .collect();

        if parts.is_empty() { None } else { Some(parts.join(", ")) }
    }
}

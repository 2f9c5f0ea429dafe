use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::incidents::models::Address;
use crate::shared::validation::{validate_postal_code, validate_state_code};

/// Address as entered; matched against existing addresses on save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddressInput {
    #[serde(default)]
    #[validate(length(max = 20, message = "Street number must be at most 20 characters"))]
    pub street_number: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Route must be at most 255 characters"))]
    pub route: String,

    #[validate(length(min = 1, max = 255, message = "City is required"))]
    pub city: String,

    #[validate(custom(function = "validate_state_code"))]
    pub state: String,

    #[serde(default)]
    #[validate(custom(function = "validate_postal_code"))]
    pub postal_code: String,
}

impl AddressInput {
    pub fn is_blank(&self) -> bool {
        [
            &self.street_number,
            &self.route,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
        .iter()
        .all(|v| v.trim().is_empty())
    }

    /// Trimmed copy, with the state upper-cased
    pub fn normalized(&self) -> Self {
        Self {
            street_number: self.street_number.trim().to_string(),
            route: self.route.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_uppercase(),
            postal_code: self.postal_code.trim().to_string(),
        }
    }
}

impl From<Address> for AddressInput {
    fn from(a: Address) -> Self {
        Self {
            street_number: a.street_number,
            route: a.route,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
        }
    }
}

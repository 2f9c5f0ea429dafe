use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Address flattened with its city and state
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: i64,
    pub street_number: String,
    pub route: String,
    pub city: String,
    /// Two-letter state abbreviation
    pub state: String,
    pub postal_code: String,
}

impl Address {
    pub const SELECT: &'static str = r#"
        SELECT a.id, a.street_number, a.route, c.name AS city, s.abbreviation AS state, a.postal_code
        FROM addresses a
        JOIN cities c ON c.id = a.city_id
        JOIN states s ON s.id = c.state_id
    "#;

    /// Single-line form, e.g. `55 Trinity Ave SW, Atlanta, GA 30303`
    pub fn one_line(&self) -> String {
        let street = format!("{} {}", self.street_number, self.route);
        let mut line = street.trim().to_string();
        if !line.is_empty() {
            line.push_str(", ");
        }
        line.push_str(&self.city);
        line.push_str(", ");
        line.push_str(&self.state);
        if !self.postal_code.is_empty() {
            line.push(' ');
            line.push_str(&self.postal_code);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line() {
        let mut address = Address {
            id: 1,
            street_number: "55".to_string(),
            route: "Trinity Ave SW".to_string(),
            city: "Atlanta".to_string(),
            state: "GA".to_string(),
            postal_code: "30303".to_string(),
        };
        assert_eq!(address.one_line(), "55 Trinity Ave SW, Atlanta, GA 30303");

        address.street_number.clear();
        address.route.clear();
        address.postal_code.clear();
        assert_eq!(address.one_line(), "Atlanta, GA");
    }
}

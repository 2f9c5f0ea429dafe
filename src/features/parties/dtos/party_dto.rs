use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::incidents::dtos::AddressInput;
use crate::features::incidents::models::Address;
use crate::features::parties::models::{Party, PartyType, Race, Sex};
use crate::shared::dates::parse_date;
use crate::shared::types::IdRef;
use crate::shared::validation::{validate_eye_color, validate_hair_color, validate_state_code};

/// Victim or suspect as submitted. The party type comes from the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PartyInput {
    #[serde(default)]
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: String,

    pub officer_signed: Option<IdRef>,

    #[serde(default)]
    pub juvenile: bool,

    #[validate(nested)]
    pub home_address: Option<AddressInput>,

    /// Any format accepted by the date parser, e.g. `1980-4-2` or `4/2/1980`
    pub date_of_birth: Option<String>,

    pub sex: Option<Sex>,

    pub race: Option<Race>,

    /// Inches
    #[validate(range(min = 0, max = 120, message = "Height must be 0-120 inches"))]
    pub height: Option<i32>,

    /// Pounds
    #[validate(range(min = 0, max = 1500, message = "Weight must be 0-1500 pounds"))]
    pub weight: Option<i32>,

    #[validate(custom(function = "validate_hair_color"))]
    pub hair_color: Option<String>,

    #[validate(custom(function = "validate_eye_color"))]
    pub eye_color: Option<String>,

    #[validate(length(max = 100))]
    pub drivers_license: Option<String>,

    #[validate(custom(function = "validate_state_code"))]
    pub drivers_license_state: Option<String>,

    #[validate(length(max = 200))]
    pub employer: Option<String>,

    #[validate(nested)]
    pub employer_address: Option<AddressInput>,

    #[validate(length(max = 100))]
    pub build: Option<String>,

    #[validate(length(max = 255))]
    pub tattoos: Option<String>,

    #[validate(length(max = 255))]
    pub scars: Option<String>,

    #[validate(length(max = 255))]
    pub hairstyle: Option<String>,

    /// Position within the incident's victims or suspects; appended when omitted
    pub display_sequence: Option<i32>,
}

impl PartyInput {
    pub fn parsed_date_of_birth(&self) -> Result<Option<NaiveDate>> {
        match self.date_of_birth.as_deref() {
            Some(raw) => parse_date(raw).map_err(|_| {
                AppError::InvalidFields(vec![format!(
                    "date_of_birth: Enter a valid date, got '{}'",
                    raw
                )])
            }),
            None => Ok(None),
        }
    }
}

/// Partial update; omitted fields are left unchanged. The party type cannot be changed.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePartyDto {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    pub officer_signed: Option<IdRef>,

    pub juvenile: Option<bool>,

    #[validate(nested)]
    pub home_address: Option<AddressInput>,

    pub date_of_birth: Option<String>,

    pub sex: Option<Sex>,

    pub race: Option<Race>,

    #[validate(range(min = 0, max = 120, message = "Height must be 0-120 inches"))]
    pub height: Option<i32>,

    #[validate(range(min = 0, max = 1500, message = "Weight must be 0-1500 pounds"))]
    pub weight: Option<i32>,

    #[validate(custom(function = "validate_hair_color"))]
    pub hair_color: Option<String>,

    #[validate(custom(function = "validate_eye_color"))]
    pub eye_color: Option<String>,

    #[validate(length(max = 100))]
    pub drivers_license: Option<String>,

    #[validate(custom(function = "validate_state_code"))]
    pub drivers_license_state: Option<String>,

    #[validate(length(max = 200))]
    pub employer: Option<String>,

    #[validate(nested)]
    pub employer_address: Option<AddressInput>,

    #[validate(length(max = 100))]
    pub build: Option<String>,

    #[validate(length(max = 255))]
    pub tattoos: Option<String>,

    #[validate(length(max = 255))]
    pub scars: Option<String>,

    #[validate(length(max = 255))]
    pub hairstyle: Option<String>,

    pub display_sequence: Option<i32>,
}

impl UpdatePartyDto {
    /// Overlay the supplied fields on the stored party's current values
    pub fn merge_into(
        self,
        party: &Party,
        home_address: Option<Address>,
        employer_address: Option<Address>,
    ) -> PartyInput {
        PartyInput {
            first_name: self.first_name.unwrap_or_else(|| party.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| party.last_name.clone()),
            officer_signed: self
                .officer_signed
                .or(party.officer_signed_id.map(IdRef::Id)),
            juvenile: self.juvenile.unwrap_or(party.juvenile),
            home_address: self.home_address.or(home_address.map(Into::into)),
            date_of_birth: self
                .date_of_birth
                .or_else(|| party.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string())),
            sex: self.sex.or(party.sex),
            race: self.race.or(party.race),
            height: self.height.or(party.height),
            weight: self.weight.or(party.weight),
            hair_color: self.hair_color.or_else(|| party.hair_color.clone()),
            eye_color: self.eye_color.or_else(|| party.eye_color.clone()),
            drivers_license: self.drivers_license.or_else(|| party.drivers_license.clone()),
            drivers_license_state: self
                .drivers_license_state
                .or_else(|| party.drivers_license_state.clone()),
            employer: self.employer.or_else(|| party.employer.clone()),
            employer_address: self.employer_address.or(employer_address.map(Into::into)),
            build: self.build.or_else(|| party.build.clone()),
            tattoos: self.tattoos.or_else(|| party.tattoos.clone()),
            scars: self.scars.or_else(|| party.scars.clone()),
            hairstyle: self.hairstyle.or_else(|| party.hairstyle.clone()),
            display_sequence: Some(self.display_sequence.unwrap_or(party.display_sequence)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartyResponseDto {
    pub id: i64,
    pub incident: i64,
    pub party_type: PartyType,
    pub first_name: String,
    pub last_name: String,
    pub officer_signed: Option<i64>,
    pub juvenile: bool,
    pub home_address: Option<Address>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub race: Option<Race>,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub hair_color: Option<String>,
    pub eye_color: Option<String>,
    pub drivers_license: Option<String>,
    pub drivers_license_state: Option<String>,
    pub employer: Option<String>,
    pub employer_address: Option<Address>,
    pub build: Option<String>,
    pub tattoos: Option<String>,
    pub scars: Option<String>,
    pub hairstyle: Option<String>,
    pub display_sequence: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartyResponseDto {
    pub fn from_party(
        p: Party,
        home_address: Option<Address>,
        employer_address: Option<Address>,
    ) -> Self {
        Self {
            id: p.id,
            incident: p.incident_id,
            party_type: p.party_type,
            first_name: p.first_name,
            last_name: p.last_name,
            officer_signed: p.officer_signed_id,
            juvenile: p.juvenile,
            home_address,
            date_of_birth: p.date_of_birth,
            sex: p.sex,
            race: p.race,
            height: p.height,
            weight: p.weight,
            hair_color: p.hair_color,
            eye_color: p.eye_color,
            drivers_license: p.drivers_license,
            drivers_license_state: p.drivers_license_state,
            employer: p.employer,
            employer_address,
            build: p.build,
            tattoos: p.tattoos,
            scars: p.scars,
            hairstyle: p.hairstyle,
            display_sequence: p.display_sequence,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_party_codes_are_validated() {
        let party: PartyInput = serde_json::from_value(json!({
            "first_name": "Sam",
            "hair_color": "HAZ",
            "eye_color": "HAZ",
            "drivers_license_state": "ZZ",
            "height": 200
        }))
        .unwrap();

        let err: AppError = party.validate().unwrap_err().into();
        let AppError::InvalidFields(fields) = err else {
            panic!("expected field errors");
        };
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().any(|f| f.starts_with("hair_color")));
        assert!(fields.iter().any(|f| f.starts_with("drivers_license_state")));
        assert!(fields.iter().any(|f| f.starts_with("height")));
    }

    #[test]
    fn test_unknown_race_is_rejected_at_parse() {
        let result: std::result::Result<PartyInput, _> =
            serde_json::from_value(json!({"race": "MARTIAN"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_date_of_birth_parsing() {
        let party = PartyInput {
            date_of_birth: Some("4/2/1980".to_string()),
            ..Default::default()
        };
        assert_eq!(
            party.parsed_date_of_birth().unwrap(),
            NaiveDate::from_ymd_opt(1980, 4, 2)
        );

        let party = PartyInput {
            date_of_birth: Some("not a date".to_string()),
            ..Default::default()
        };
        assert!(party.parsed_date_of_birth().is_err());
    }

    #[test]
    fn test_party_type_is_not_accepted_on_update() {
        let dto: UpdatePartyDto =
            serde_json::from_value(json!({"party_type": "SUSPECT", "first_name": "Lee"})).unwrap();
        assert_eq!(dto.first_name.as_deref(), Some("Lee"));
    }
}

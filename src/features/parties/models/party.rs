use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
    sqlx::Type,
)]
#[sqlx(type_name = "party_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyType {
    Victim,
    Suspect,
}

impl PartyType {
    pub const ALL: [PartyType; 2] = [PartyType::Victim, PartyType::Suspect];

    pub fn code(self) -> &'static str {
        match self {
            PartyType::Victim => "VICTIM",
            PartyType::Suspect => "SUSPECT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PartyType::Victim => "Victim",
            PartyType::Suspect => "Suspect",
        }
    }

    /// Plural used in URLs and form prefixes: `victims`, `suspects`
    pub fn plural(self) -> &'static str {
        match self {
            PartyType::Victim => "victims",
            PartyType::Suspect => "suspects",
        }
    }

    /// Prefix of search keys filtering on this party type: `victim_`, `suspect_`
    pub fn search_prefix(self) -> &'static str {
        match self {
            PartyType::Victim => "victim_",
            PartyType::Suspect => "suspect_",
        }
    }

    pub fn from_plural(plural: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.plural() == plural)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "sex")]
pub enum Sex {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "race")]
pub enum Race {
    #[serde(rename = "ASIAN")]
    #[sqlx(rename = "ASIAN")]
    Asian,
    #[serde(rename = "BLACK")]
    #[sqlx(rename = "BLACK")]
    Black,
    #[serde(rename = "NATIVE")]
    #[sqlx(rename = "NATIVE")]
    Native,
    #[serde(rename = "HAWAIIAN/PACIFIC_ISLANDER")]
    #[sqlx(rename = "HAWAIIAN/PACIFIC_ISLANDER")]
    PacificIslander,
    #[serde(rename = "WHITE")]
    #[sqlx(rename = "WHITE")]
    White,
    #[serde(rename = "OTHER")]
    #[sqlx(rename = "OTHER")]
    Other,
}

impl Race {
    pub const ALL: [Race; 6] = [
        Race::Asian,
        Race::Black,
        Race::Native,
        Race::PacificIslander,
        Race::White,
        Race::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Race::Asian => "ASIAN",
            Race::Black => "BLACK",
            Race::Native => "NATIVE",
            Race::PacificIslander => "HAWAIIAN/PACIFIC_ISLANDER",
            Race::White => "WHITE",
            Race::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Race::Asian => "Asian",
            Race::Black => "Black/African American",
            Race::Native => "Native American",
            Race::PacificIslander => "Native Hawaiian/Pacific Islander",
            Race::White => "White",
            Race::Other => "Other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

/// Victim or suspect row as stored
#[derive(Debug, Clone, FromRow)]
pub struct Party {
    pub id: i64,
    pub incident_id: i64,
    pub officer_signed_id: Option<i64>,
    pub party_type: PartyType,
    pub first_name: String,
    pub last_name: String,
    pub juvenile: bool,
    pub home_address_id: Option<i64>,
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
    pub employer_address_id: Option<i64>,
    pub build: Option<String>,
    pub tattoos: Option<String>,
    pub scars: Option<String>,
    pub hairstyle: Option<String>,
    pub display_sequence: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Party {
    pub const COLUMNS: &'static str = "id, incident_id, officer_signed_id, party_type, \
        first_name, last_name, juvenile, home_address_id, date_of_birth, sex, race, height, \
        weight, hair_color, eye_color, drivers_license, drivers_license_state, employer, \
        employer_address_id, build, tattoos, scars, hairstyle, display_sequence, created_at, \
        updated_at";

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_type_names() {
        assert_eq!(PartyType::from_plural("suspects"), Some(PartyType::Suspect));
        assert_eq!(PartyType::from_plural("witnesses"), None);
        assert_eq!(
            serde_json::to_string(&PartyType::Victim).unwrap(),
            "\"VICTIM\""
        );
    }

    #[test]
    fn test_race_round_trips_through_code() {
        for race in Race::ALL {
            assert_eq!(Race::from_code(race.code()), Some(race));
        }
        let parsed: Race = serde_json::from_str("\"HAWAIIAN/PACIFIC_ISLANDER\"").unwrap();
        assert_eq!(parsed, Race::PacificIslander);
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "shift")]
pub enum Shift {
    #[serde(rename = "D")]
    #[sqlx(rename = "D")]
    Day,
    #[serde(rename = "E")]
    #[sqlx(rename = "E")]
    Evening,
    #[serde(rename = "N")]
    #[sqlx(rename = "N")]
    Night,
}

impl Shift {
    pub const ALL: [Shift; 3] = [Shift::Day, Shift::Evening, Shift::Night];

    pub fn code(self) -> &'static str {
        match self {
            Shift::Day => "D",
            Shift::Evening => "E",
            Shift::Night => "N",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Shift::Day => "Day",
            Shift::Evening => "Evening",
            Shift::Night => "Night",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// Incident row as stored
#[derive(Debug, Clone, FromRow)]
pub struct Incident {
    pub id: i64,
    pub incident_number: String,
    pub report_datetime: DateTime<Utc>,
    pub reporting_officer_id: i64,
    pub reviewed_by_officer_id: i64,
    pub reviewed_datetime: Option<DateTime<Utc>>,
    pub investigating_officer_id: i64,
    pub officer_making_report_id: i64,
    pub supervisor_id: i64,
    pub approved_datetime: Option<DateTime<Utc>>,
    pub earliest_occurrence_datetime: DateTime<Utc>,
    pub latest_occurrence_datetime: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub beat: i32,
    pub shift: Shift,
    pub damaged_amount: Decimal,
    pub stolen_amount: Decimal,
    pub narrative: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    pub const COLUMNS: &'static str = "i.id, i.incident_number, i.report_datetime, \
        i.reporting_officer_id, i.reviewed_by_officer_id, i.reviewed_datetime, \
        i.investigating_officer_id, i.officer_making_report_id, i.supervisor_id, \
        i.approved_datetime, i.earliest_occurrence_datetime, i.latest_occurrence_datetime, \
        i.location_id, i.beat, i.shift, i.damaged_amount, i.stolen_amount, i.narrative, \
        i.created_at, i.updated_at";
}

/// Officer as shown on an incident
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct OfficerSummary {
    pub id: i64,
    pub officer_number: i32,
    pub first_name: String,
    pub last_name: String,
}

impl OfficerSummary {
    /// `Last, First (#1234)`
    pub fn display(&self) -> String {
        let name = match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
            (false, true) => self.last_name.clone(),
            (true, false) => self.first_name.clone(),
            (true, true) => String::new(),
        };
        format!("{} (#{})", name, self.officer_number)
            .trim()
            .to_string()
    }
}

/// One row of the incident list and search results
#[derive(Debug, Clone, FromRow)]
pub struct IncidentListRow {
    pub id: i64,
    pub incident_number: String,
    pub report_datetime: DateTime<Utc>,
    pub reporting_officer_id: i64,
    pub reporting_officer_number: i32,
    pub reporting_officer_first_name: String,
    pub reporting_officer_last_name: String,
    pub earliest_occurrence_datetime: DateTime<Utc>,
    pub latest_occurrence_datetime: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub location_street_number: Option<String>,
    pub location_route: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_postal_code: Option<String>,
    pub beat: i32,
    pub shift: Shift,
    pub damaged_amount: Decimal,
    pub stolen_amount: Decimal,
    pub offense_ids: Vec<i64>,
}

impl IncidentListRow {
    /// Select list and joins shared by listing and search. Table aliases:
    /// `i` incident, `ro`/`ru` reporting officer and user, `la`/`lc`/`ls` location.
    pub const SELECT: &'static str = r#"
        SELECT i.id, i.incident_number, i.report_datetime,
               ro.id AS reporting_officer_id,
               ro.officer_number AS reporting_officer_number,
               ru.first_name AS reporting_officer_first_name,
               ru.last_name AS reporting_officer_last_name,
               i.earliest_occurrence_datetime, i.latest_occurrence_datetime,
               la.id AS location_id,
               la.street_number AS location_street_number,
               la.route AS location_route,
               lc.name AS location_city,
               ls.abbreviation AS location_state,
               la.postal_code AS location_postal_code,
               i.beat, i.shift, i.damaged_amount, i.stolen_amount,
               ARRAY(
                   SELECT io.offense_id FROM incident_offenses io
                   WHERE io.incident_id = i.id ORDER BY io.offense_id
               ) AS offense_ids
    "#;

    pub const FROM: &'static str = r#"
        FROM incidents i
        JOIN officers ro ON ro.id = i.reporting_officer_id
        JOIN users ru ON ru.id = ro.user_id
        LEFT JOIN addresses la ON la.id = i.location_id
        LEFT JOIN cities lc ON lc.id = la.city_id
        LEFT JOIN states ls ON ls.id = lc.state_id
    "#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_codes() {
        assert_eq!(Shift::from_code("E"), Some(Shift::Evening));
        assert_eq!(Shift::from_code("X"), None);
        assert_eq!(serde_json::to_string(&Shift::Night).unwrap(), "\"N\"");
    }

    #[test]
    fn test_officer_display() {
        let officer = OfficerSummary {
            id: 1,
            officer_number: 4021,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        assert_eq!(officer.display(), "Lovelace, Ada (#4021)");
    }
}

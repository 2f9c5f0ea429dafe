use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::incident_files::dtos::IncidentFileDto;
use crate::features::incidents::dtos::AddressInput;
use crate::features::incidents::models::{
    Address, Incident, IncidentListRow, OfficerSummary, Shift,
};
use crate::features::offenses::models::Offense;
use crate::features::parties::dtos::{PartyInput, PartyResponseDto};
use crate::shared::dates::DateTimeInput;
use crate::shared::types::IdRef;
use crate::shared::validation::INCIDENT_NUMBER_REGEX;

/// Largest amount that fits NUMERIC(12, 2)
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateIncidentDto {
    #[validate(
        length(min = 1, max = 35, message = "Incident number must be 1-35 characters"),
        regex(
            path = *INCIDENT_NUMBER_REGEX,
            message = "Incident number may contain only letters, digits, '.', '-' and '_'"
        )
    )]
    pub incident_number: String,

    pub report_datetime: DateTimeInput,

    pub reporting_officer: IdRef,
    pub reviewed_by_officer: IdRef,
    pub reviewed_datetime: Option<DateTimeInput>,
    pub investigating_officer: IdRef,
    pub officer_making_report: IdRef,
    pub supervisor: IdRef,
    pub approved_datetime: Option<DateTimeInput>,

    pub earliest_occurrence_datetime: DateTimeInput,
    pub latest_occurrence_datetime: DateTimeInput,

    #[validate(nested)]
    pub location: Option<AddressInput>,

    #[validate(range(min = 0, message = "Beat must not be negative"))]
    pub beat: i32,

    pub shift: Shift,

    #[serde(default)]
    pub damaged_amount: Option<Decimal>,

    #[serde(default)]
    pub stolen_amount: Option<Decimal>,

    pub narrative: Option<String>,

    #[serde(default)]
    pub offenses: Vec<IdRef>,

    #[serde(default)]
    #[validate(nested)]
    pub victims: Vec<PartyInput>,

    #[serde(default)]
    #[validate(nested)]
    pub suspects: Vec<PartyInput>,
}

/// Partial update of the incident's own fields. Victims, suspects and files
/// are managed through their nested endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateIncidentDto {
    #[validate(
        length(min = 1, max = 35, message = "Incident number must be 1-35 characters"),
        regex(
            path = *INCIDENT_NUMBER_REGEX,
            message = "Incident number may contain only letters, digits, '.', '-' and '_'"
        )
    )]
    pub incident_number: Option<String>,
    pub report_datetime: Option<DateTimeInput>,
    pub reporting_officer: Option<IdRef>,
    pub reviewed_by_officer: Option<IdRef>,
    /// A blank value clears the field
    pub reviewed_datetime: Option<DateTimeInput>,
    pub investigating_officer: Option<IdRef>,
    pub officer_making_report: Option<IdRef>,
    pub supervisor: Option<IdRef>,
    /// A blank value clears the field
    pub approved_datetime: Option<DateTimeInput>,
    pub earliest_occurrence_datetime: Option<DateTimeInput>,
    pub latest_occurrence_datetime: Option<DateTimeInput>,
    #[validate(nested)]
    pub location: Option<AddressInput>,
    #[validate(range(min = 0, message = "Beat must not be negative"))]
    pub beat: Option<i32>,
    pub shift: Option<Shift>,
    pub damaged_amount: Option<Decimal>,
    pub stolen_amount: Option<Decimal>,
    pub narrative: Option<String>,
    /// Replaces the whole offense set
    pub offenses: Option<Vec<IdRef>>,
}

/// Fully resolved incident fields, ready to write
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentValues {
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
    pub location: Option<AddressInput>,
    pub beat: i32,
    pub shift: Shift,
    pub damaged_amount: Decimal,
    pub stolen_amount: Decimal,
    pub narrative: Option<String>,
    pub offense_ids: Vec<i64>,
}

/// Collects per-field problems so a request reports all of them at once
#[derive(Default)]
struct FieldErrors(Vec<String>);

impl FieldErrors {
    fn datetime(&mut self, field: &str, input: &DateTimeInput) -> Option<DateTime<Utc>> {
        match input.resolve() {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                self.0.push(format!("{}: This field is required.", field));
                None
            }
            Err(_) => {
                self.0
                    .push(format!("{}: Enter a valid date/time.", field));
                None
            }
        }
    }

    fn optional_datetime(
        &mut self,
        field: &str,
        input: Option<&DateTimeInput>,
    ) -> Option<DateTime<Utc>> {
        match input.map(DateTimeInput::resolve) {
            None => None,
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                self.0
                    .push(format!("{}: Enter a valid date/time.", field));
                None
            }
        }
    }

    fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            let mut fields = self.0;
            fields.sort();
            Err(AppError::InvalidFields(fields))
        }
    }
}

fn dedup_ids(refs: &[IdRef]) -> Vec<i64> {
    let mut ids: Vec<i64> = refs.iter().map(|r| r.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl IncidentValues {
    /// Cross-field and money checks shared by create and update
    fn check(&self, errors: &mut FieldErrors) {
        if self.earliest_occurrence_datetime > self.latest_occurrence_datetime {
            errors.0.push(
                "latest_occurrence_datetime: Must not be before earliest_occurrence_datetime."
                    .to_string(),
            );
        }

        for (field, amount) in [
            ("damaged_amount", self.damaged_amount),
            ("stolen_amount", self.stolen_amount),
        ] {
            if amount.is_sign_negative() && !amount.is_zero() {
                errors.0.push(format!("{}: Must not be negative.", field));
            } else if amount.normalize().scale() > 2 {
                errors
                    .0
                    .push(format!("{}: At most 2 decimal places are allowed.", field));
            } else if amount > MAX_AMOUNT {
                errors
                    .0
                    .push(format!("{}: Ensure there are no more than 12 digits.", field));
            }
        }
    }

    /// Current values of a stored incident, for merging a partial update
    pub fn from_existing(incident: &Incident, location: Option<Address>, offense_ids: Vec<i64>) -> Self {
        Self {
            incident_number: incident.incident_number.clone(),
            report_datetime: incident.report_datetime,
            reporting_officer_id: incident.reporting_officer_id,
            reviewed_by_officer_id: incident.reviewed_by_officer_id,
            reviewed_datetime: incident.reviewed_datetime,
            investigating_officer_id: incident.investigating_officer_id,
            officer_making_report_id: incident.officer_making_report_id,
            supervisor_id: incident.supervisor_id,
            approved_datetime: incident.approved_datetime,
            earliest_occurrence_datetime: incident.earliest_occurrence_datetime,
            latest_occurrence_datetime: incident.latest_occurrence_datetime,
            location: location.map(Into::into),
            beat: incident.beat,
            shift: incident.shift,
            damaged_amount: incident.damaged_amount,
            stolen_amount: incident.stolen_amount,
            narrative: incident.narrative.clone(),
            offense_ids,
        }
    }

    /// All officer ids referenced, for existence checks
    pub fn officer_ids(&self) -> [i64; 5] {
        [
            self.reporting_officer_id,
            self.reviewed_by_officer_id,
            self.investigating_officer_id,
            self.officer_making_report_id,
            self.supervisor_id,
        ]
    }
}

impl CreateIncidentDto {
    /// Resolve datetimes and references, splitting off the parties
    pub fn resolve(self) -> Result<(IncidentValues, Vec<PartyInput>, Vec<PartyInput>)> {
        let mut errors = FieldErrors::default();

        let report_datetime = errors.datetime("report_datetime", &self.report_datetime);
        let earliest =
            errors.datetime("earliest_occurrence_datetime", &self.earliest_occurrence_datetime);
        let latest =
            errors.datetime("latest_occurrence_datetime", &self.latest_occurrence_datetime);
        let reviewed_datetime =
            errors.optional_datetime("reviewed_datetime", self.reviewed_datetime.as_ref());
        let approved_datetime =
            errors.optional_datetime("approved_datetime", self.approved_datetime.as_ref());

        let (Some(report_datetime), Some(earliest), Some(latest)) =
            (report_datetime, earliest, latest)
        else {
            errors.into_result()?;
            return Err(AppError::Internal("datetime resolution failed".to_string()));
        };

        let values = IncidentValues {
            incident_number: self.incident_number.trim().to_string(),
            report_datetime,
            reporting_officer_id: self.reporting_officer.id(),
            reviewed_by_officer_id: self.reviewed_by_officer.id(),
            reviewed_datetime,
            investigating_officer_id: self.investigating_officer.id(),
            officer_making_report_id: self.officer_making_report.id(),
            supervisor_id: self.supervisor.id(),
            approved_datetime,
            earliest_occurrence_datetime: earliest,
            latest_occurrence_datetime: latest,
            location: self
                .location
                .filter(|l| !l.is_blank())
                .map(|l| l.normalized()),
            beat: self.beat,
            shift: self.shift,
            damaged_amount: self.damaged_amount.unwrap_or_default(),
            stolen_amount: self.stolen_amount.unwrap_or_default(),
            narrative: self.narrative.filter(|n| !n.trim().is_empty()),
            offense_ids: dedup_ids(&self.offenses),
        };

        values.check(&mut errors);
        errors.into_result()?;

        Ok((values, self.victims, self.suspects))
    }
}

impl UpdateIncidentDto {
    /// Overlay this update on the current values and re-check the result
    pub fn apply(self, mut values: IncidentValues) -> Result<IncidentValues> {
        let mut errors = FieldErrors::default();

        if let Some(number) = self.incident_number {
            values.incident_number = number.trim().to_string();
        }
        if let Some(input) = &self.report_datetime {
            if let Some(dt) = errors.datetime("report_datetime", input) {
                values.report_datetime = dt;
            }
        }
        if let Some(input) = &self.earliest_occurrence_datetime {
            if let Some(dt) = errors.datetime("earliest_occurrence_datetime", input) {
                values.earliest_occurrence_datetime = dt;
            }
        }
        if let Some(input) = &self.latest_occurrence_datetime {
            if let Some(dt) = errors.datetime("latest_occurrence_datetime", input) {
                values.latest_occurrence_datetime = dt;
            }
        }
        if self.reviewed_datetime.is_some() {
            values.reviewed_datetime =
                errors.optional_datetime("reviewed_datetime", self.reviewed_datetime.as_ref());
        }
        if self.approved_datetime.is_some() {
            values.approved_datetime =
                errors.optional_datetime("approved_datetime", self.approved_datetime.as_ref());
        }

        if let Some(officer) = self.reporting_officer {
            values.reporting_officer_id = officer.id();
        }
        if let Some(officer) = self.reviewed_by_officer {
            values.reviewed_by_officer_id = officer.id();
        }
        if let Some(officer) = self.investigating_officer {
            values.investigating_officer_id = officer.id();
        }
        if let Some(officer) = self.officer_making_report {
            values.officer_making_report_id = officer.id();
        }
        if let Some(officer) = self.supervisor {
            values.supervisor_id = officer.id();
        }

        if let Some(location) = self.location {
            values.location = Some(location).filter(|l| !l.is_blank()).map(|l| l.normalized());
        }
        if let Some(beat) = self.beat {
            values.beat = beat;
        }
        if let Some(shift) = self.shift {
            values.shift = shift;
        }
        if let Some(amount) = self.damaged_amount {
            values.damaged_amount = amount;
        }
        if let Some(amount) = self.stolen_amount {
            values.stolen_amount = amount;
        }
        if let Some(narrative) = self.narrative {
            values.narrative = Some(narrative).filter(|n| !n.trim().is_empty());
        }
        if let Some(offenses) = &self.offenses {
            values.offense_ids = dedup_ids(offenses);
        }

        values.check(&mut errors);
        errors.into_result()?;
        Ok(values)
    }
}

/// Incident as listed or returned from search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentSummaryDto {
    pub id: i64,
    pub incident_number: String,
    pub report_datetime: DateTime<Utc>,
    pub reporting_officer: OfficerSummary,
    pub earliest_occurrence_datetime: DateTime<Utc>,
    pub latest_occurrence_datetime: DateTime<Utc>,
    pub location: Option<Address>,
    pub beat: i32,
    pub shift: Shift,
    pub damaged_amount: Decimal,
    pub stolen_amount: Decimal,
    /// Offense ids
    pub offenses: Vec<i64>,
}

impl From<IncidentListRow> for IncidentSummaryDto {
    fn from(row: IncidentListRow) -> Self {
        let location = match (row.location_id, row.location_city, row.location_state) {
            (Some(id), Some(city), Some(state)) => Some(Address {
                id,
                street_number: row.location_street_number.unwrap_or_default(),
                route: row.location_route.unwrap_or_default(),
                city,
                state,
                postal_code: row.location_postal_code.unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            incident_number: row.incident_number,
            report_datetime: row.report_datetime,
            reporting_officer: OfficerSummary {
                id: row.reporting_officer_id,
                officer_number: row.reporting_officer_number,
                first_name: row.reporting_officer_first_name,
                last_name: row.reporting_officer_last_name,
            },
            earliest_occurrence_datetime: row.earliest_occurrence_datetime,
            latest_occurrence_datetime: row.latest_occurrence_datetime,
            location,
            beat: row.beat,
            shift: row.shift,
            damaged_amount: row.damaged_amount,
            stolen_amount: row.stolen_amount,
            offenses: row.offense_ids,
        }
    }
}

/// Incident with every related record expanded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentDetailDto {
    pub id: i64,
    pub incident_number: String,
    pub report_datetime: DateTime<Utc>,
    pub reporting_officer: OfficerSummary,
    pub reviewed_by_officer: OfficerSummary,
    pub reviewed_datetime: Option<DateTime<Utc>>,
    pub investigating_officer: OfficerSummary,
    pub officer_making_report: OfficerSummary,
    pub supervisor: OfficerSummary,
    pub approved_datetime: Option<DateTime<Utc>>,
    pub earliest_occurrence_datetime: DateTime<Utc>,
    pub latest_occurrence_datetime: DateTime<Utc>,
    pub location: Option<Address>,
    pub beat: i32,
    pub shift: Shift,
    pub damaged_amount: Decimal,
    pub stolen_amount: Decimal,
    pub narrative: Option<String>,
    pub offenses: Vec<Offense>,
    pub victims: Vec<PartyResponseDto>,
    pub suspects: Vec<PartyResponseDto>,
    pub files: Vec<IncidentFileDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_body() -> serde_json::Value {
        json!({
            "incident_number": "2024-000123",
            "report_datetime": {"date": "3/1/2024", "time": "14:30"},
            "reporting_officer": 1,
            "reviewed_by_officer": {"id": 2},
            "investigating_officer": 1,
            "officer_making_report": 1,
            "supervisor": 2,
            "earliest_occurrence_datetime": "2024-2-29 23:00",
            "latest_occurrence_datetime": "2024-03-01T01:15:00Z",
            "location": {
                "street_number": "55",
                "route": "Trinity Ave SW",
                "city": "Atlanta",
                "state": "GA",
                "postal_code": "30303"
            },
            "beat": 404,
            "shift": "N",
            "damaged_amount": "120.50",
            "offenses": [3, {"id": 1}, 3],
            "victims": [{"first_name": "Pat", "last_name": "Doe"}]
        })
    }

    #[test]
    fn test_create_resolves_mixed_shapes() {
        let dto: CreateIncidentDto = serde_json::from_value(create_body()).unwrap();
        assert!(dto.validate().is_ok());

        let (values, victims, suspects) = dto.resolve().unwrap();
        assert_eq!(
            values.report_datetime,
            Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()
        );
        assert_eq!(values.reviewed_by_officer_id, 2);
        assert_eq!(values.offense_ids, vec![1, 3]);
        assert_eq!(values.damaged_amount, Decimal::new(12050, 2));
        assert_eq!(values.stolen_amount, Decimal::ZERO);
        assert_eq!(values.shift, Shift::Night);
        assert_eq!(victims.len(), 1);
        assert!(suspects.is_empty());
    }

    #[test]
    fn test_create_reports_every_bad_field() {
        let mut body = create_body();
        body["report_datetime"] = json!("last tuesday");
        body["latest_occurrence_datetime"] = json!("2024-2-1");
        body["stolen_amount"] = json!("-5");
        let dto: CreateIncidentDto = serde_json::from_value(body).unwrap();

        match dto.resolve() {
            Err(AppError::InvalidFields(fields)) => {
                assert_eq!(fields, vec!["report_datetime: Enter a valid date/time.".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_occurrence_window_and_amount_checks() {
        let mut body = create_body();
        body["latest_occurrence_datetime"] = json!("2024-2-1");
        body["stolen_amount"] = json!("-5");
        body["damaged_amount"] = json!("1.005");
        let dto: CreateIncidentDto = serde_json::from_value(body).unwrap();

        match dto.resolve() {
            Err(AppError::InvalidFields(fields)) => {
                assert_eq!(fields.len(), 3);
                assert!(fields[0].starts_with("damaged_amount"));
                assert!(fields[1].starts_with("latest_occurrence_datetime"));
                assert!(fields[2].starts_with("stolen_amount"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_update_overlays_and_clears() {
        let dto: CreateIncidentDto = serde_json::from_value(create_body()).unwrap();
        let (mut values, _, _) = dto.resolve().unwrap();
        values.reviewed_datetime = Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap());

        let update: UpdateIncidentDto = serde_json::from_value(json!({
            "beat": 12,
            "reviewed_datetime": "",
            "offenses": [],
            "narrative": "Window broken."
        }))
        .unwrap();

        let merged = update.apply(values.clone()).unwrap();
        assert_eq!(merged.beat, 12);
        assert_eq!(merged.reviewed_datetime, None);
        assert!(merged.offense_ids.is_empty());
        assert_eq!(merged.narrative.as_deref(), Some("Window broken."));
        assert_eq!(merged.incident_number, values.incident_number);
    }

    #[test]
    fn test_invalid_incident_number() {
        let mut body = create_body();
        body["incident_number"] = json!("../../etc");
        let dto: CreateIncidentDto = serde_json::from_value(body).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_max_amount_constant() {
        assert_eq!(MAX_AMOUNT.to_string(), "9999999999.99");
    }
}

//! Flat, prefix-encoded incident forms as posted by the web UI.
//!
//! Incident fields are plain keys (`beat`, `location_city`), offenses repeat
//! the `offenses` key, and parties are keyed `victims-0-first_name`,
//! `suspects-2-home_address_city` and so on.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::core::error::{AppError, Result};
use crate::features::incidents::dtos::{AddressInput, CreateIncidentDto, IncidentDetailDto};
use crate::features::incidents::models::{Address, Shift};
use crate::features::parties::dtos::{PartyInput, PartyResponseDto};
use crate::features::parties::models::{PartyType, Race, Sex};
use crate::shared::dates::DateTimeInput;
use crate::shared::types::IdRef;

const MANAGEMENT_KEYS: [&str; 4] = ["TOTAL_FORMS", "INITIAL_FORMS", "MIN_NUM_FORMS", "MAX_NUM_FORMS"];

const ADDRESS_PARTS: [&str; 5] = ["street_number", "route", "city", "state", "postal_code"];

const FORM_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

const TRUTHY: [&str; 5] = ["true", "True", "1", "on", "yes"];

pub type PartyGroups = BTreeMap<(PartyType, usize), BTreeMap<String, String>>;

/// `build_prefix("victims", 0)` is `victims-0-`
pub fn build_prefix(value: &str, arg: impl Display) -> String {
    format!("{}-{}-", value, arg)
}

/// Group `victims-N-field` and `suspects-N-field` keys by party and index.
/// Management keys are skipped, and so are groups with nothing filled in.
pub fn get_party_groups(data: &[(String, String)]) -> PartyGroups {
    let mut groups = PartyGroups::new();

    for (key, value) in data {
        let mut parts = key.splitn(3, '-');
        let (Some(plural), Some(index), Some(field)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Some(party_type) = PartyType::from_plural(plural) else {
            continue;
        };
        if MANAGEMENT_KEYS.contains(&field) {
            continue;
        }
        let Ok(index) = index.parse::<usize>() else {
            continue;
        };

        groups
            .entry((party_type, index))
            .or_default()
            .insert(field.to_string(), value.clone());
    }

    groups.retain(|_, fields| fields.values().any(|v| !v.trim().is_empty()));
    groups
}

/// Collect `<prefix>_street_number`, `<prefix>_city` etc. into an address.
/// Returns `None` when every part is blank.
pub fn split_address(prefix: &str, fields: &BTreeMap<String, String>) -> Option<AddressInput> {
    let part = |name: &str| {
        fields
            .get(&format!("{}_{}", prefix, name))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let address = AddressInput {
        street_number: part("street_number"),
        route: part("route"),
        city: part("city"),
        state: part("state").to_uppercase(),
        postal_code: part("postal_code"),
    };

    if address.is_blank() {
        None
    } else {
        Some(address)
    }
}

/// Field reader that records every problem instead of stopping at the first
struct FormReader<'a> {
    fields: &'a BTreeMap<String, String>,
    /// Prefix used in error messages, e.g. `victims-0-`
    prefix: String,
    errors: &'a mut Vec<String>,
}

impl FormReader<'_> {
    fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn error(&mut self, key: &str, message: &str) {
        self.errors
            .push(format!("{}{}: {}", self.prefix, key, message));
    }

    fn required(&mut self, key: &str) -> String {
        match self.text(key) {
            Some(value) => value,
            None => {
                self.error(key, "This field is required.");
                String::new()
            }
        }
    }

    fn parse<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = self.text(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(key, &format!("'{}' is not a valid value.", raw));
                None
            }
        }
    }

    fn choice<T>(&mut self, key: &str, from_code: fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.text(key)?;
        let value = from_code(&raw.to_uppercase());
        if value.is_none() {
            self.error(key, &format!("'{}' is not one of the available choices.", raw));
        }
        value
    }

    fn flag(&self, key: &str) -> bool {
        self.text(key)
            .is_some_and(|v| TRUTHY.contains(&v.as_str()))
    }

    fn id(&mut self, key: &str) -> Option<IdRef> {
        self.parse::<i64>(key).map(IdRef::Id)
    }

    fn required_id(&mut self, key: &str) -> IdRef {
        if self.text(key).is_none() {
            self.error(key, "This field is required.");
            return IdRef::Id(0);
        }
        self.id(key).unwrap_or(IdRef::Id(0))
    }

    fn datetime(&mut self, key: &str) -> DateTimeInput {
        DateTimeInput::Text(self.required(key))
    }

    fn upper(&self, key: &str) -> Option<String> {
        self.text(key).map(|v| v.to_uppercase())
    }
}

fn party_from_fields(
    party_type: PartyType,
    index: usize,
    fields: &BTreeMap<String, String>,
    errors: &mut Vec<String>,
) -> PartyInput {
    let mut form = FormReader {
        fields,
        prefix: build_prefix(party_type.plural(), index),
        errors,
    };

    PartyInput {
        first_name: form.text("first_name").unwrap_or_default(),
        last_name: form.text("last_name").unwrap_or_default(),
        officer_signed: form.id("officer_signed"),
        juvenile: form.flag("juvenile"),
        home_address: split_address("home_address", fields),
        date_of_birth: form.text("date_of_birth"),
        sex: form.choice("sex", Sex::from_code),
        race: form.choice("race", Race::from_code),
        height: form.parse("height"),
        weight: form.parse("weight"),
        hair_color: form.upper("hair_color"),
        eye_color: form.upper("eye_color"),
        drivers_license: form.text("drivers_license"),
        drivers_license_state: form.upper("drivers_license_state"),
        employer: form.text("employer"),
        employer_address: split_address("employer_address", fields),
        build: form.text("build"),
        tattoos: form.text("tattoos"),
        scars: form.text("scars"),
        hairstyle: form.text("hairstyle"),
        display_sequence: i32::try_from(index).ok(),
    }
}

pub struct IncidentForm;

impl IncidentForm {
    /// Parse a complete urlencoded incident form into the JSON create payload
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<CreateIncidentDto> {
        let mut errors = Vec::new();

        let mut scalars = BTreeMap::new();
        let mut offenses = Vec::new();
        for (key, value) in pairs {
            if key == "offenses" {
                for id in value.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                    match id.parse::<i64>() {
                        Ok(id) => offenses.push(IdRef::Id(id)),
                        Err(_) => errors.push(format!("offenses: '{}' is not a valid offense.", id)),
                    }
                }
            } else if !key.starts_with("victims-") && !key.starts_with("suspects-") {
                scalars.insert(key.clone(), value.clone());
            }
        }

        let mut form = FormReader {
            fields: &scalars,
            prefix: String::new(),
            errors: &mut errors,
        };

        let incident_number = form.required("incident_number");
        let report_datetime = form.datetime("report_datetime");
        let reporting_officer = form.required_id("reporting_officer");
        let reviewed_by_officer = form.required_id("reviewed_by_officer");
        let reviewed_datetime = form.text("reviewed_datetime").map(DateTimeInput::Text);
        let investigating_officer = form.required_id("investigating_officer");
        let officer_making_report = form.required_id("officer_making_report");
        let supervisor = form.required_id("supervisor");
        let approved_datetime = form.text("approved_datetime").map(DateTimeInput::Text);
        let earliest_occurrence_datetime = form.datetime("earliest_occurrence_datetime");
        let latest_occurrence_datetime = form.datetime("latest_occurrence_datetime");
        let beat = match form.parse::<i32>("beat") {
            Some(beat) => beat,
            None => {
                if form.text("beat").is_none() {
                    form.error("beat", "This field is required.");
                }
                0
            }
        };
        let shift = match form.choice("shift", Shift::from_code) {
            Some(shift) => shift,
            None => {
                if form.text("shift").is_none() {
                    form.error("shift", "This field is required.");
                }
                Shift::Day
            }
        };
        let damaged_amount = form.parse::<Decimal>("damaged_amount");
        let stolen_amount = form.parse::<Decimal>("stolen_amount");
        let narrative = form.text("narrative");
        let location = split_address("location", &scalars);

        let mut victims = Vec::new();
        let mut suspects = Vec::new();
        for ((party_type, index), fields) in get_party_groups(pairs) {
            let party = party_from_fields(party_type, index, &fields, &mut errors);
            match party_type {
                PartyType::Victim => victims.push(party),
                PartyType::Suspect => suspects.push(party),
            }
        }

        if !errors.is_empty() {
            errors.sort();
            return Err(AppError::InvalidFields(errors));
        }

        Ok(CreateIncidentDto {
            incident_number,
            report_datetime,
            reporting_officer,
            reviewed_by_officer,
            reviewed_datetime,
            investigating_officer,
            officer_making_report,
            supervisor,
            approved_datetime,
            earliest_occurrence_datetime,
            latest_occurrence_datetime,
            location,
            beat,
            shift,
            damaged_amount,
            stolen_amount,
            narrative,
            offenses,
            victims,
            suspects,
        })
    }
}

fn push_address(data: &mut Vec<(String, String)>, prefix: &str, address: Option<&Address>) {
    let Some(address) = address else {
        return;
    };
    let values = [
        &address.street_number,
        &address.route,
        &address.city,
        &address.state,
        &address.postal_code,
    ];
    for (part, value) in ADDRESS_PARTS.iter().zip(values) {
        data.push((format!("{}_{}", prefix, part), value.clone()));
    }
}

fn push_party(data: &mut Vec<(String, String)>, prefix: &str, party: &PartyResponseDto) {
    let mut field = |name: &str, value: String| {
        data.push((format!("{}{}", prefix, name), value));
    };

    field("id", party.id.to_string());
    field("first_name", party.first_name.clone());
    field("last_name", party.last_name.clone());
    if let Some(officer) = party.officer_signed {
        field("officer_signed", officer.to_string());
    }
    if party.juvenile {
        field("juvenile", "on".to_string());
    }
    if let Some(dob) = party.date_of_birth {
        field("date_of_birth", dob.format("%Y-%m-%d").to_string());
    }
    if let Some(sex) = party.sex {
        field("sex", sex.code().to_string());
    }
    if let Some(race) = party.race {
        field("race", race.code().to_string());
    }

    let optional = [
        ("height", party.height.map(|v| v.to_string())),
        ("weight", party.weight.map(|v| v.to_string())),
        ("hair_color", party.hair_color.clone()),
        ("eye_color", party.eye_color.clone()),
        ("drivers_license", party.drivers_license.clone()),
        ("drivers_license_state", party.drivers_license_state.clone()),
        ("employer", party.employer.clone()),
        ("build", party.build.clone()),
        ("tattoos", party.tattoos.clone()),
        ("scars", party.scars.clone()),
        ("hairstyle", party.hairstyle.clone()),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            field(name, value);
        }
    }

    push_address(data, &format!("{}home_address", prefix), party.home_address.as_ref());
    push_address(
        data,
        &format!("{}employer_address", prefix),
        party.employer_address.as_ref(),
    );
}

/// Initial form data for editing an existing incident
pub fn flatten_incident(detail: &IncidentDetailDto) -> Vec<(String, String)> {
    let mut data: Vec<(String, String)> = vec![
        ("incident_number".into(), detail.incident_number.clone()),
        (
            "report_datetime".into(),
            detail.report_datetime.format(FORM_DATETIME).to_string(),
        ),
        ("reporting_officer".into(), detail.reporting_officer.id.to_string()),
        ("reviewed_by_officer".into(), detail.reviewed_by_officer.id.to_string()),
        ("investigating_officer".into(), detail.investigating_officer.id.to_string()),
        ("officer_making_report".into(), detail.officer_making_report.id.to_string()),
        ("supervisor".into(), detail.supervisor.id.to_string()),
        (
            "earliest_occurrence_datetime".into(),
            detail.earliest_occurrence_datetime.format(FORM_DATETIME).to_string(),
        ),
        (
            "latest_occurrence_datetime".into(),
            detail.latest_occurrence_datetime.format(FORM_DATETIME).to_string(),
        ),
        ("beat".into(), detail.beat.to_string()),
        ("shift".into(), detail.shift.code().to_string()),
        ("damaged_amount".into(), detail.damaged_amount.to_string()),
        ("stolen_amount".into(), detail.stolen_amount.to_string()),
    ];

    if let Some(reviewed) = detail.reviewed_datetime {
        data.push(("reviewed_datetime".into(), reviewed.format(FORM_DATETIME).to_string()));
    }
    if let Some(approved) = detail.approved_datetime {
        data.push(("approved_datetime".into(), approved.format(FORM_DATETIME).to_string()));
    }
    if let Some(narrative) = &detail.narrative {
        data.push(("narrative".into(), narrative.clone()));
    }
    push_address(&mut data, "location", detail.location.as_ref());
    for offense in &detail.offenses {
        data.push(("offenses".into(), offense.id.to_string()));
    }

    for (party_type, parties) in [
        (PartyType::Victim, &detail.victims),
        (PartyType::Suspect, &detail.suspects),
    ] {
        let plural = party_type.plural();
        for (index, party) in parties.iter().enumerate() {
            push_party(&mut data, &build_prefix(plural, index), party);
        }
        let count = parties.len().to_string();
        data.push((format!("{}-TOTAL_FORMS", plural), count.clone()));
        data.push((format!("{}-INITIAL_FORMS", plural), count));
        data.push((format!("{}-MIN_NUM_FORMS", plural), "0".to_string()));
        data.push((format!("{}-MAX_NUM_FORMS", plural), "1000".to_string()));
    }

    data
}

/// Collapse flattened pairs into one value per key. Repeated keys such as
/// `offenses` are joined with `,`, which [`IncidentForm::from_pairs`] splits again.
pub fn form_fields(data: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in data {
        match fields.get_mut(&key) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => {
                fields.insert(key, value);
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::features::incidents::models::OfficerSummary;
    use crate::features::offenses::models::Offense;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn officer(id: i64) -> OfficerSummary {
        OfficerSummary {
            id,
            officer_number: 1000 + id as i32,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[test]
    fn test_build_prefix() {
        assert_eq!(build_prefix("foo", "5"), "foo-5-");
        assert_eq!(build_prefix("victims", 0), "victims-0-");
    }

    #[test]
    fn test_get_party_groups() {
        let data = pairs(&[
            ("victims-TOTAL_FORMS", "2"),
            ("victims-INITIAL_FORMS", "0"),
            ("victims-0-first_name", "Pat"),
            ("victims-0-last_name", "Doe"),
            ("victims-1-first_name", "  "),
            ("suspects-0-hair_color", "BRO"),
            ("witnesses-0-first_name", "Nope"),
            ("beat", "12"),
        ]);

        let groups = get_party_groups(&data);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&(PartyType::Victim, 0)]["last_name"], "Doe");
        assert_eq!(groups[&(PartyType::Suspect, 0)]["hair_color"], "BRO");
        assert!(!groups.contains_key(&(PartyType::Victim, 1)));
    }

    #[test]
    fn test_split_address() {
        let fields: BTreeMap<String, String> = pairs(&[
            ("home_address_street_number", "12"),
            ("home_address_route", "Elm St"),
            ("home_address_city", "Macon"),
            ("home_address_state", "ga"),
        ])
        .into_iter()
        .collect();

        let address = split_address("home_address", &fields).unwrap();
        assert_eq!(address.state, "GA");
        assert_eq!(address.postal_code, "");
        assert!(split_address("employer_address", &fields).is_none());
    }

    #[test]
    fn test_form_parses_incident_and_parties() {
        let data = pairs(&[
            ("incident_number", "2024-77"),
            ("report_datetime", "3/1/2024 14:30"),
            ("reporting_officer", "1"),
            ("reviewed_by_officer", "2"),
            ("investigating_officer", "1"),
            ("officer_making_report", "1"),
            ("supervisor", "2"),
            ("earliest_occurrence_datetime", "2024-02-29 23:00"),
            ("latest_occurrence_datetime", "2024-03-01 01:00"),
            ("location_city", "Atlanta"),
            ("location_state", "GA"),
            ("beat", "404"),
            ("shift", "e"),
            ("stolen_amount", "25.00"),
            ("offenses", "3"),
            ("offenses", "5,6"),
            ("victims-TOTAL_FORMS", "1"),
            ("victims-0-first_name", "Pat"),
            ("victims-0-juvenile", "on"),
            ("victims-0-race", "white"),
            ("suspects-1-last_name", "Roe"),
        ]);

        let dto = IncidentForm::from_pairs(&data).unwrap();
        assert_eq!(dto.incident_number, "2024-77");
        assert_eq!(dto.shift, Shift::Evening);
        assert_eq!(dto.offenses, vec![IdRef::Id(3), IdRef::Id(5), IdRef::Id(6)]);
        assert_eq!(dto.location.as_ref().map(|l| l.city.as_str()), Some("Atlanta"));
        assert_eq!(dto.damaged_amount, None);
        assert_eq!(dto.stolen_amount, Some(Decimal::new(2500, 2)));
        assert_eq!(dto.victims.len(), 1);
        assert!(dto.victims[0].juvenile);
        assert_eq!(dto.victims[0].race, Some(Race::White));
        assert_eq!(dto.victims[0].display_sequence, Some(0));
        assert_eq!(dto.suspects[0].display_sequence, Some(1));
    }

    #[test]
    fn test_form_collects_errors() {
        let data = pairs(&[
            ("incident_number", "2024-78"),
            ("beat", "north"),
            ("shift", "Z"),
            ("victims-0-height", "tall"),
        ]);

        let Err(AppError::InvalidFields(errors)) = IncidentForm::from_pairs(&data) else {
            panic!("expected field errors");
        };
        assert!(errors.contains(&"beat: 'north' is not a valid value.".to_string()));
        assert!(errors.contains(&"report_datetime: This field is required.".to_string()));
        assert!(errors.contains(&"shift: 'Z' is not one of the available choices.".to_string()));
        assert!(errors.contains(&"victims-0-height: 'tall' is not a valid value.".to_string()));
        assert!(errors.contains(&"supervisor: This field is required.".to_string()));
    }

    fn sample_detail() -> IncidentDetailDto {
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let victim = PartyResponseDto {
            id: 11,
            incident: 1,
            party_type: PartyType::Victim,
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            officer_signed: None,
            juvenile: true,
            home_address: None,
            date_of_birth: NaiveDate::from_ymd_opt(2010, 5, 4),
            sex: Some(Sex::Female),
            race: None,
            height: Some(60),
            weight: None,
            hair_color: None,
            eye_color: Some("BLU".to_string()),
            drivers_license: None,
            drivers_license_state: None,
            employer: None,
            employer_address: None,
            build: None,
            tattoos: None,
            scars: None,
            hairstyle: None,
            display_sequence: 0,
            created_at: when,
            updated_at: when,
        };
        IncidentDetailDto {
            id: 1,
            incident_number: "2024-79".to_string(),
            report_datetime: when,
            reporting_officer: officer(1),
            reviewed_by_officer: officer(2),
            reviewed_datetime: None,
            investigating_officer: officer(1),
            officer_making_report: officer(1),
            supervisor: officer(2),
            approved_datetime: None,
            earliest_occurrence_datetime: when,
            latest_occurrence_datetime: when,
            location: Some(Address {
                id: 9,
                street_number: "55".to_string(),
                route: "Trinity Ave SW".to_string(),
                city: "Atlanta".to_string(),
                state: "GA".to_string(),
                postal_code: "30303".to_string(),
            }),
            beat: 7,
            shift: Shift::Night,
            damaged_amount: Decimal::new(1050, 2),
            stolen_amount: Decimal::ZERO,
            narrative: Some("Window broken.".to_string()),
            offenses: Vec::new(),
            victims: vec![victim],
            suspects: Vec::new(),
            files: Vec::new(),
            created_at: when,
            updated_at: when,
        }
    }

    #[test]
    fn test_flatten_incident_feeds_the_form_back() {
        let detail = sample_detail();
        let data = flatten_incident(&detail);
        let lookup = |key: &str| {
            data.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(lookup("report_datetime"), Some("2024-03-01 14:30:00"));
        assert_eq!(lookup("location_route"), Some("Trinity Ave SW"));
        assert_eq!(lookup("victims-TOTAL_FORMS"), Some("1"));
        assert_eq!(lookup("suspects-TOTAL_FORMS"), Some("0"));
        assert_eq!(lookup("victims-0-juvenile"), Some("on"));
        assert_eq!(lookup("victims-0-sex"), Some("F"));

        let dto = IncidentForm::from_pairs(&data).unwrap();
        assert_eq!(dto.incident_number, "2024-79");
        assert_eq!(dto.damaged_amount, Some(Decimal::new(1050, 2)));
        assert_eq!(dto.victims[0].date_of_birth.as_deref(), Some("2010-05-04"));
        assert_eq!(dto.victims[0].eye_color.as_deref(), Some("BLU"));
        assert_eq!(
            dto.location.map(|l| l.postal_code),
            Some("30303".to_string())
        );
    }

    fn offense(id: i64) -> Offense {
        Offense {
            id,
            gcic_code: format!("16-8-{}", id),
            ucr_code: "0500".to_string(),
            ucr_rank: None,
            code_group: None,
            ucr_alpha: "BURGLARY".to_string(),
            ucr_name_classification: "Burglary".to_string(),
            ucr_subclass_description: String::new(),
        }
    }

    #[test]
    fn test_form_fields_keep_every_offense() {
        let mut detail = sample_detail();
        detail.offenses = vec![offense(1), offense(2), offense(3)];

        let fields = form_fields(flatten_incident(&detail));
        assert_eq!(fields["offenses"], "1,2,3");
        assert_eq!(fields["incident_number"], "2024-79");

        let posted: Vec<(String, String)> = fields.into_iter().collect();
        let dto = IncidentForm::from_pairs(&posted).unwrap();
        assert_eq!(dto.offenses, vec![IdRef::Id(1), IdRef::Id(2), IdRef::Id(3)]);
        assert_eq!(dto.victims.len(), 1);
    }

    #[test]
    fn test_form_fields_without_repeats() {
        let fields = form_fields(pairs(&[("beat", "7"), ("shift", "N")]));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["beat"], "7");
    }
}

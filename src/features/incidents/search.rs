//! Translation of free-form search parameters into SQL predicates.
//!
//! Keys name a field, optionally with a range marker (`beat_min`,
//! `max_stolen_amount`) or a `victim_`/`suspect_` prefix (`victim_height_max`,
//! `suspect_min_date_of_birth`). Every filter on one
//! party type must hold for the same party row.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::incidents::models::Shift;
use crate::features::parties::models::{PartyType, Race, Sex};
use crate::shared::constants::{is_known_code, EYE_COLORS, HAIR_COLORS};
use crate::shared::dates::{make_aware, parse_date, parse_date_string};

const PAGINATION_KEYS: [&str; 2] = ["page", "page_size"];

const TRUTHY: [&str; 5] = ["true", "True", "1", "on", "yes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exact,
    IExact,
    IContains,
    Gte,
    Lte,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Code(&'static [(&'static str, &'static str)]),
    Int,
    Amount,
    DateTime,
    Date,
    Bool,
    Shift,
    Sex,
    Race,
    Officer,
    Offenses,
}

impl Kind {
    fn is_ordered(self) -> bool {
        matches!(self, Kind::Int | Kind::Amount | Kind::DateTime | Kind::Date)
    }

    fn default_op(self) -> Op {
        match self {
            Kind::Text => Op::IContains,
            Kind::Officer => Op::IExact,
            Kind::Offenses => Op::In,
            _ => Op::Exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i32),
    Amount(Decimal),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Bool(bool),
    Shift(Shift),
    Sex(Sex),
    Race(Race),
    Ids(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Column expression the predicate applies to
    pub column: &'static str,
    pub op: Op,
    pub value: Value,
}

fn incident_field(name: &str) -> Option<(&'static str, Kind)> {
    let field = match name {
        "incident_number" => ("i.incident_number", Kind::Text),
        "report_datetime" => ("i.report_datetime", Kind::DateTime),
        "reviewed_datetime" => ("i.reviewed_datetime", Kind::DateTime),
        "approved_datetime" => ("i.approved_datetime", Kind::DateTime),
        "earliest_occurrence_datetime" => ("i.earliest_occurrence_datetime", Kind::DateTime),
        "latest_occurrence_datetime" => ("i.latest_occurrence_datetime", Kind::DateTime),
        "beat" => ("i.beat", Kind::Int),
        "shift" => ("i.shift", Kind::Shift),
        "damaged_amount" | "damage_amount" => ("i.damaged_amount", Kind::Amount),
        "stolen_amount" => ("i.stolen_amount", Kind::Amount),
        "narrative" => ("i.narrative", Kind::Text),
        "offenses" => ("io.offense_id", Kind::Offenses),
        "reporting_officer" => ("i.reporting_officer_id", Kind::Officer),
        "reviewed_by_officer" => ("i.reviewed_by_officer_id", Kind::Officer),
        "investigating_officer" => ("i.investigating_officer_id", Kind::Officer),
        "officer_making_report" => ("i.officer_making_report_id", Kind::Officer),
        "supervisor" => ("i.supervisor_id", Kind::Officer),
        "location_street_number" => ("la.street_number", Kind::Text),
        "location_route" => ("la.route", Kind::Text),
        "location_city" => ("lc.name", Kind::Text),
        "location_state" => ("ls.abbreviation", Kind::Text),
        "location_postal_code" => ("la.postal_code", Kind::Text),
        _ => return None,
    };
    Some(field)
}

fn party_field(name: &str) -> Option<(&'static str, Kind)> {
    let field = match name {
        "first_name" => ("p.first_name", Kind::Text),
        "last_name" => ("p.last_name", Kind::Text),
        "juvenile" => ("p.juvenile", Kind::Bool),
        "date_of_birth" => ("p.date_of_birth", Kind::Date),
        "sex" => ("p.sex", Kind::Sex),
        "race" => ("p.race", Kind::Race),
        "height" => ("p.height", Kind::Int),
        "weight" => ("p.weight", Kind::Int),
        "build" => ("p.build", Kind::Text),
        "tattoos" => ("p.tattoos", Kind::Text),
        "scars" => ("p.scars", Kind::Text),
        "hairstyle" => ("p.hairstyle", Kind::Text),
        "hair_color" => ("p.hair_color", Kind::Code(HAIR_COLORS)),
        "eye_color" => ("p.eye_color", Kind::Code(EYE_COLORS)),
        "drivers_license" => ("p.drivers_license", Kind::Text),
        "employer" => ("p.employer", Kind::Text),
        _ => return None,
    };
    Some(field)
}

/// Split a search key into its field name and range operator, if any.
///
/// `beat_min` and `min_beat` are `beat >=`; `earliest_*` and `latest_*`
/// keep their name and compare `>=` and `<=` respectively.
pub fn cleanse_filter_key(key: &str) -> (&str, Option<Op>) {
    if let Some(field) = key.strip_suffix("_min").or_else(|| key.strip_prefix("min_")) {
        return (field, Some(Op::Gte));
    }
    if let Some(field) = key.strip_suffix("_max").or_else(|| key.strip_prefix("max_")) {
        return (field, Some(Op::Lte));
    }
    if key.starts_with("earliest_") {
        return (key, Some(Op::Gte));
    }
    if key.starts_with("latest_") {
        return (key, Some(Op::Lte));
    }
    (key, None)
}

fn invalid(key: &str, message: &str) -> AppError {
    AppError::Validation(format!("{}: {}", key, message))
}

/// Parse one raw value for a field of the given kind
fn cleanse_value(key: &str, kind: Kind, raw: &str) -> Result<Value> {
    let value = match kind {
        Kind::Text | Kind::Officer => Value::Text(raw.to_string()),
        Kind::Code(table) => {
            let code = raw.to_uppercase();
            if !is_known_code(table, &code) {
                return Err(invalid(key, &format!("'{}' is not a valid choice", raw)));
            }
            Value::Text(code)
        }
        Kind::Int => Value::Int(
            raw.parse()
                .map_err(|_| invalid(key, &format!("'{}' is not a whole number", raw)))?,
        ),
        Kind::Amount => Value::Amount(
            Decimal::from_str(raw)
                .map_err(|_| invalid(key, &format!("'{}' is not a valid amount", raw)))?,
        ),
        Kind::DateTime => match parse_date_string(raw) {
            Ok(Some(naive)) => Value::DateTime(make_aware(naive)),
            _ => return Err(invalid(key, &format!("'{}' is not a valid date/time", raw))),
        },
        Kind::Date => match parse_date(raw) {
            Ok(Some(date)) => Value::Date(date),
            _ => return Err(invalid(key, &format!("'{}' is not a valid date", raw))),
        },
        Kind::Bool => Value::Bool(TRUTHY.contains(&raw)),
        Kind::Shift => Value::Shift(
            Shift::from_code(&raw.to_uppercase())
                .ok_or_else(|| invalid(key, &format!("'{}' is not a valid shift", raw)))?,
        ),
        Kind::Sex => Value::Sex(
            Sex::from_code(&raw.to_uppercase())
                .ok_or_else(|| invalid(key, &format!("'{}' is not a valid sex", raw)))?,
        ),
        Kind::Race => Value::Race(
            Race::from_code(&raw.to_uppercase())
                .ok_or_else(|| invalid(key, &format!("'{}' is not a valid race", raw)))?,
        ),
        Kind::Offenses => {
            let ids = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<i64>()
                        .map_err(|_| invalid(key, &format!("'{}' is not an offense id", s)))
                })
                .collect::<Result<Vec<_>>>()?;
            Value::Ids(ids)
        }
    };
    Ok(value)
}

/// Typed incident filters
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IncidentSearch {
    pub incident: Vec<Condition>,
    pub parties: BTreeMap<PartyType, Vec<Condition>>,
}

impl IncidentSearch {
    pub fn is_empty(&self) -> bool {
        self.incident.is_empty() && self.parties.is_empty()
    }

    fn offenses_mut(&mut self) -> Option<&mut Vec<i64>> {
        self.incident.iter_mut().find_map(|c| match &mut c.value {
            Value::Ids(ids) if c.op == Op::In => Some(ids),
            _ => None,
        })
    }

    /// Append ` WHERE ...` for these filters. The query must select from
    /// `incidents i` joined with the location aliases `la`, `lc` and `ls`.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        for condition in &self.incident {
            builder.push(" AND ");
            push_incident_condition(builder, condition);
        }

        for (party_type, conditions) in &self.parties {
            builder
                .push(
                    " AND EXISTS (SELECT 1 FROM incident_involved_parties p \
                     WHERE p.incident_id = i.id AND p.party_type = ",
                )
                .push_bind(*party_type);
            for condition in conditions {
                builder.push(" AND ");
                push_condition(builder, condition);
            }
            builder.push(")");
        }
    }
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value.clone() {
        Value::Text(v) => builder.push_bind(v),
        Value::Int(v) => builder.push_bind(v),
        Value::Amount(v) => builder.push_bind(v),
        Value::DateTime(v) => builder.push_bind(v),
        Value::Date(v) => builder.push_bind(v),
        Value::Bool(v) => builder.push_bind(v),
        Value::Shift(v) => builder.push_bind(v),
        Value::Sex(v) => builder.push_bind(v),
        Value::Race(v) => builder.push_bind(v),
        Value::Ids(v) => builder.push_bind(v),
    };
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    let column = condition.column;
    match (condition.op, &condition.value) {
        (Op::IContains, Value::Text(text)) => {
            builder
                .push(column)
                .push(" ILIKE ")
                .push_bind(like_pattern(text));
        }
        (Op::IExact, _) => {
            builder.push("LOWER(").push(column).push(") = LOWER(");
            push_value(builder, &condition.value);
            builder.push(")");
        }
        (op, value) => {
            let operator = match op {
                Op::Gte => " >= ",
                Op::Lte => " <= ",
                _ => " = ",
            };
            builder.push(column).push(operator);
            push_value(builder, value);
        }
    }
}

fn push_incident_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    match condition.op {
        Op::In => {
            builder.push(
                "EXISTS (SELECT 1 FROM incident_offenses io \
                 WHERE io.incident_id = i.id AND io.offense_id = ANY(",
            );
            push_value(builder, &condition.value);
            builder.push("))");
        }
        Op::IExact => {
            builder
                .push(condition.column)
                .push(
                    " IN (SELECT fo.id FROM officers fo JOIN users fu ON fu.id = fo.user_id \
                     WHERE LOWER(fu.last_name) = LOWER(",
                );
            push_value(builder, &condition.value);
            builder.push("))");
        }
        _ => push_condition(builder, condition),
    }
}

/// Translate raw query parameters into typed filters.
///
/// Blank values and unknown keys are skipped. Malformed values fail with a
/// validation error naming the key.
pub fn parse_search(params: &[(String, String)]) -> Result<IncidentSearch> {
    let mut search = IncidentSearch::default();

    for (key, raw) in params {
        let raw = raw.trim();
        if raw.is_empty() || PAGINATION_KEYS.contains(&key.as_str()) {
            continue;
        }

        let (name, mut range) = cleanse_filter_key(key);
        let (party_type, field) = match PartyType::ALL
            .into_iter()
            .find_map(|t| name.strip_prefix(t.search_prefix()).map(|rest| (t, rest)))
        {
            Some((party_type, rest)) => {
                // victim_min_date_of_birth carries its range marker after the prefix
                let (rest, party_range) = cleanse_filter_key(rest);
                range = range.or(party_range);
                (Some(party_type), party_field(rest))
            }
            None => (None, incident_field(name)),
        };

        let Some((column, kind)) = field else {
            tracing::debug!("Ignoring unknown search key '{}'", key);
            continue;
        };

        let op = match range {
            Some(op) if kind.is_ordered() => op,
            Some(_) => {
                return Err(invalid(key, "Range filters apply only to numbers and dates"));
            }
            None => kind.default_op(),
        };

        let value = cleanse_value(key, kind, raw)?;

        if let (Value::Ids(ids), Some(existing)) = (&value, search.offenses_mut()) {
            existing.extend(ids);
            continue;
        }

        let condition = Condition { column, op, value };
        match party_type {
            Some(party_type) => search.parties.entry(party_type).or_default().push(condition),
            None => search.incident.push(condition),
        }
    }

    if let Some(ids) = search.offenses_mut() {
        ids.sort_unstable();
        ids.dedup();
    }

    Ok(search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn where_sql(search: &IncidentSearch) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT i.id FROM incidents i");
        search.push_where(&mut builder);
        builder.sql().to_string()
    }

    #[test]
    fn test_cleanse_filter_key() {
        assert_eq!(cleanse_filter_key("beat_min"), ("beat", Some(Op::Gte)));
        assert_eq!(cleanse_filter_key("min_beat"), ("beat", Some(Op::Gte)));
        assert_eq!(cleanse_filter_key("stolen_amount_max"), ("stolen_amount", Some(Op::Lte)));
        assert_eq!(cleanse_filter_key("max_stolen_amount"), ("stolen_amount", Some(Op::Lte)));
        assert_eq!(
            cleanse_filter_key("earliest_occurrence_datetime"),
            ("earliest_occurrence_datetime", Some(Op::Gte))
        );
        assert_eq!(
            cleanse_filter_key("latest_occurrence_datetime"),
            ("latest_occurrence_datetime", Some(Op::Lte))
        );
        assert_eq!(cleanse_filter_key("narrative"), ("narrative", None));
    }

    #[test]
    fn test_range_and_datetime_values() {
        let search = parse_search(&pairs(&[
            ("min_damage_amount", "100"),
            ("earliest_occurrence_datetime", "3/1/2024 08:00"),
            ("report_datetime_max", "2024-3-31"),
        ]))
        .unwrap();

        assert_eq!(
            search.incident,
            vec![
                Condition {
                    column: "i.damaged_amount",
                    op: Op::Gte,
                    value: Value::Amount(Decimal::new(100, 0)),
                },
                Condition {
                    column: "i.earliest_occurrence_datetime",
                    op: Op::Gte,
                    value: Value::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()),
                },
                Condition {
                    column: "i.report_datetime",
                    op: Op::Lte,
                    value: Value::DateTime(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()),
                },
            ]
        );
    }

    #[test]
    fn test_offenses_collect_repeated_and_comma_separated() {
        let search = parse_search(&pairs(&[
            ("offenses", "4,2"),
            ("offenses", "9"),
            ("offenses", "2"),
        ]))
        .unwrap();

        assert_eq!(search.incident.len(), 1);
        assert_eq!(search.incident[0].op, Op::In);
        assert_eq!(search.incident[0].value, Value::Ids(vec![2, 4, 9]));
        assert!(where_sql(&search).contains("io.offense_id = ANY($1)"));
    }

    #[test]
    fn test_officer_role_matches_last_name() {
        let search = parse_search(&pairs(&[("reporting_officer", "Smith")])).unwrap();
        assert_eq!(search.incident[0].op, Op::IExact);

        let sql = where_sql(&search);
        assert!(sql.contains("i.reporting_officer_id IN (SELECT fo.id FROM officers fo"));
        assert!(sql.contains("LOWER(fu.last_name) = LOWER($1)"));
    }

    #[test]
    fn test_text_fields_use_icontains() {
        let search = parse_search(&pairs(&[("narrative", "50%_off")])).unwrap();
        assert_eq!(search.incident[0].op, Op::IContains);
        assert!(where_sql(&search).contains("i.narrative ILIKE $1"));
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_juvenile_truthiness() {
        for (raw, expected) in [
            ("true", true),
            ("True", true),
            ("1", true),
            ("on", true),
            ("yes", true),
            ("false", false),
            ("TRUE", false),
            ("no", false),
        ] {
            let search = parse_search(&pairs(&[("victim_juvenile", raw)])).unwrap();
            assert_eq!(
                search.parties[&PartyType::Victim][0].value,
                Value::Bool(expected),
                "value {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_party_filters_share_one_row() {
        let search = parse_search(&pairs(&[
            ("victim_last_name", "doe"),
            ("victim_juvenile", "yes"),
            ("suspect_hair_color", "bro"),
            ("beat", "12"),
        ]))
        .unwrap();

        let sql = where_sql(&search);
        assert_eq!(sql.matches("EXISTS (SELECT 1 FROM incident_involved_parties").count(), 2);
        assert!(sql.contains(
            "p.party_type = $2 AND p.last_name ILIKE $3 AND p.juvenile = $4)"
        ));
        assert!(sql.contains("p.party_type = $5 AND p.hair_color = $6)"));
        assert_eq!(
            search.parties[&PartyType::Suspect][0].value,
            Value::Text("BRO".to_string())
        );
    }

    #[test]
    fn test_party_keys_use_singular_prefix() {
        let search = parse_search(&pairs(&[
            ("victim_last_name", "Doe"),
            ("suspect_juvenile", "true"),
        ]))
        .unwrap();
        assert_eq!(search.parties[&PartyType::Victim][0].column, "p.last_name");
        assert_eq!(search.parties[&PartyType::Suspect][0].value, Value::Bool(true));

        let plural = parse_search(&pairs(&[("victims_last_name", "Doe")])).unwrap();
        assert!(plural.is_empty());
    }

    #[test]
    fn test_party_range_keys() {
        let search = parse_search(&pairs(&[
            ("victim_min_date_of_birth", "1/1/1990"),
            ("victim_date_of_birth_max", "1999-12-31"),
            ("suspect_max_height", "70"),
        ]))
        .unwrap();

        assert_eq!(
            search.parties[&PartyType::Victim],
            vec![
                Condition {
                    column: "p.date_of_birth",
                    op: Op::Gte,
                    value: Value::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
                },
                Condition {
                    column: "p.date_of_birth",
                    op: Op::Lte,
                    value: Value::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
                },
            ]
        );
        assert_eq!(
            search.parties[&PartyType::Suspect],
            vec![Condition {
                column: "p.height",
                op: Op::Lte,
                value: Value::Int(70),
            }]
        );
        assert!(matches!(
            parse_search(&pairs(&[("victim_min_last_name", "doe")])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_unknown_and_pagination_keys_are_skipped() {
        let search = parse_search(&pairs(&[
            ("beat", "  "),
            ("favourite_colour", "blue"),
            ("page", "2"),
            ("page_size", "50"),
        ]))
        .unwrap();
        assert!(search.is_empty());
        assert_eq!(where_sql(&search), "SELECT i.id FROM incidents i WHERE TRUE");
    }

    #[test]
    fn test_malformed_values_name_the_key() {
        let cases = [
            ("beat", "twelve"),
            ("report_datetime_min", "yesterday"),
            ("shift", "X"),
            ("victim_race", "MARTIAN"),
            ("suspect_eye_color", "ZZZ"),
            ("offenses", "1,a"),
            ("narrative_min", "abc"),
        ];
        for (key, raw) in cases {
            match parse_search(&pairs(&[(key, raw)])) {
                Err(AppError::Validation(message)) => {
                    assert!(message.starts_with(key), "{}", message)
                }
                other => panic!("{} accepted: {:?}", key, other),
            }
        }
    }
}

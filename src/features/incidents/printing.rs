use chrono::NaiveDate;

use crate::core::error::Result;
use crate::features::incidents::dtos::IncidentDetailDto;
use crate::features::parties::dtos::PartyResponseDto;
use crate::modules::pdf::{wrap, CourierDocument};

const LEFT_PT: f32 = 15.0;
const PRINT_DATE_X_PT: f32 = 87.0;
const HEADER_Y_PT: f32 = 750.0;
const BODY_TOP_PT: f32 = 720.0;
/// Courier 10pt characters that fit between the margins
const LINE_CHARS: usize = 95;

const REPORT_DATETIME: &str = "%m/%d/%Y %H:%M";

fn party_lines(label: &str, parties: &[PartyResponseDto]) -> Vec<String> {
    if parties.is_empty() {
        return vec![format!("{}: none", label)];
    }

    let mut lines = vec![format!("{}:", label)];
    for (index, party) in parties.iter().enumerate() {
        let mut line = format!("  {}. {}", index + 1, party.full_name());
        if party.juvenile {
            line.push_str(" (juvenile)");
        }
        if let Some(dob) = party.date_of_birth {
            line.push_str(&format!(", DOB {}", dob.format("%m/%d/%Y")));
        }
        lines.push(line);
    }
    lines
}

/// Text lines of the report body, in print order
pub fn report_lines(incident: &IncidentDetailDto) -> Vec<String> {
    let mut lines = vec![
        format!("Incident Number: {}", incident.incident_number),
        format!(
            "Report Date: {}",
            incident.report_datetime.format(REPORT_DATETIME)
        ),
        format!(
            "Shift: {}    Beat: {}",
            incident.shift.label(),
            incident.beat
        ),
        format!(
            "Occurred Between: {} and {}",
            incident.earliest_occurrence_datetime.format(REPORT_DATETIME),
            incident.latest_occurrence_datetime.format(REPORT_DATETIME)
        ),
        format!(
            "Location: {}",
            incident
                .location
                .as_ref()
                .map(|l| l.one_line())
                .unwrap_or_default()
        ),
        String::new(),
        format!("Reporting Officer: {}", incident.reporting_officer.display()),
        format!("Reviewed By: {}", incident.reviewed_by_officer.display()),
        format!(
            "Investigating Officer: {}",
            incident.investigating_officer.display()
        ),
        format!(
            "Officer Making Report: {}",
            incident.officer_making_report.display()
        ),
        format!("Supervisor: {}", incident.supervisor.display()),
        String::new(),
        format!(
            "Damaged: ${}    Stolen: ${}",
            incident.damaged_amount, incident.stolen_amount
        ),
        String::new(),
    ];

    if incident.offenses.is_empty() {
        lines.push("Offenses: none".to_string());
    } else {
        lines.push("Offenses:".to_string());
        lines.extend(incident.offenses.iter().map(|o| format!("  {}", o.label())));
    }
    lines.push(String::new());

    lines.extend(party_lines("Victims", &incident.victims));
    lines.push(String::new());
    lines.extend(party_lines("Suspects", &incident.suspects));
    lines.push(String::new());

    lines.push("Narrative:".to_string());
    if let Some(narrative) = &incident.narrative {
        lines.extend(wrap(narrative, LINE_CHARS));
    }

    lines
}

/// One US-letter report for an incident, stamped with the print date
pub fn render_incident_report(incident: &IncidentDetailDto, printed_on: NaiveDate) -> Result<Vec<u8>> {
    let mut doc = CourierDocument::new(&format!("Incident {}", incident.incident_number))?;

    doc.text_at(LEFT_PT, HEADER_Y_PT, "Print Date:");
    doc.text_at(
        PRINT_DATE_X_PT,
        HEADER_Y_PT,
        &printed_on.format("%m/%d/%Y").to_string(),
    );

    doc.move_to(BODY_TOP_PT);
    for line in report_lines(incident) {
        if line.is_empty() {
            doc.blank();
        } else {
            doc.line(LEFT_PT, &line);
        }
    }

    tracing::debug!(
        "Rendered incident {} on {} page(s)",
        incident.incident_number,
        doc.page_count()
    );
    doc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::features::incidents::models::{OfficerSummary, Shift};

    fn detail() -> IncidentDetailDto {
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let officer = OfficerSummary {
            id: 1,
            officer_number: 4021,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        IncidentDetailDto {
            id: 1,
            incident_number: "2024-000123".to_string(),
            report_datetime: when,
            reporting_officer: officer.clone(),
            reviewed_by_officer: officer.clone(),
            reviewed_datetime: None,
            investigating_officer: officer.clone(),
            officer_making_report: officer.clone(),
            supervisor: officer,
            approved_datetime: None,
            earliest_occurrence_datetime: when,
            latest_occurrence_datetime: when,
            location: None,
            beat: 404,
            shift: Shift::Night,
            damaged_amount: Decimal::new(12050, 2),
            stolen_amount: Decimal::ZERO,
            narrative: Some("Rear window broken. ".repeat(40)),
            offenses: Vec::new(),
            victims: Vec::new(),
            suspects: Vec::new(),
            files: Vec::new(),
            created_at: when,
            updated_at: when,
        }
    }

    #[test]
    fn test_report_lines() {
        let lines = report_lines(&detail());
        assert_eq!(lines[0], "Incident Number: 2024-000123");
        assert!(lines.contains(&"Shift: Night    Beat: 404".to_string()));
        assert!(lines.contains(&"Reporting Officer: Lovelace, Ada (#4021)".to_string()));
        assert!(lines.contains(&"Damaged: $120.50    Stolen: $0".to_string()));
        assert!(lines.contains(&"Victims: none".to_string()));
        assert!(lines.iter().all(|l| l.chars().count() <= LINE_CHARS));
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes =
            render_incident_report(&detail(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())
                .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::features::incidents::models::Shift;
use crate::features::parties::models::{PartyType, Race, Sex};
use crate::shared::constants::{EYE_COLORS, HAIR_COLORS, STATES};

/// One selectable value and its display label
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

impl Choice {
    fn table(pairs: &[(&'static str, &'static str)]) -> Vec<Choice> {
        pairs
            .iter()
            .map(|&(value, label)| Choice { value, label })
            .collect()
    }
}

/// Every choice list the API validates against
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChoicesResponseDto {
    pub shift: Vec<Choice>,
    pub party_type: Vec<Choice>,
    pub sex: Vec<Choice>,
    pub race: Vec<Choice>,
    pub eye_color: Vec<Choice>,
    pub hair_color: Vec<Choice>,
    pub state: Vec<Choice>,
}

impl ChoicesResponseDto {
    pub fn build() -> Self {
        Self {
            shift: Shift::ALL
                .iter()
                .map(|s| Choice {
                    value: s.code(),
                    label: s.label(),
                })
                .collect(),
            party_type: PartyType::ALL
                .iter()
                .map(|p| Choice {
                    value: p.code(),
                    label: p.label(),
                })
                .collect(),
            sex: Sex::ALL
                .iter()
                .map(|s| Choice {
                    value: s.code(),
                    label: s.label(),
                })
                .collect(),
            race: Race::ALL
                .iter()
                .map(|r| Choice {
                    value: r.code(),
                    label: r.label(),
                })
                .collect(),
            eye_color: Choice::table(EYE_COLORS),
            hair_color: Choice::table(HAIR_COLORS),
            state: Choice::table(STATES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_lists() {
        let choices = ChoicesResponseDto::build();
        let values = |list: &[Choice]| list.iter().map(|c| c.value).collect::<Vec<_>>();

        assert_eq!(values(&choices.shift), vec!["D", "E", "N"]);
        assert_eq!(values(&choices.party_type), vec!["VICTIM", "SUSPECT"]);
        assert_eq!(values(&choices.sex), vec!["M", "F"]);
        assert!(values(&choices.race).contains(&"HAWAIIAN/PACIFIC_ISLANDER"));
        assert_eq!(choices.eye_color.len(), 10);
        assert_eq!(choices.hair_color.len(), 14);
        assert!(values(&choices.state).contains(&"GA"));
    }
}

use serde::{Deserialize, Serialize};

/// Coaching voice used for the system instruction of a report.
///
/// Unknown names never fail to parse: they resolve to [`CoachPersona::Standard`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CoachPersona {
    Spartan,
    WarmMentor,
    GameMaster,
    #[default]
    Standard,
}

impl CoachPersona {
    pub const ALL: [CoachPersona; 4] = [
        CoachPersona::Spartan,
        CoachPersona::WarmMentor,
        CoachPersona::GameMaster,
        CoachPersona::Standard,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "spartan" | "sparta" | "스파르타" => Self::Spartan,
            "warm_mentor" | "mentor" | "warm" | "따뜻한_멘토" => Self::WarmMentor,
            "game_master" | "gm" | "gamemaster" | "게임_마스터" => Self::GameMaster,
            _ => Self::Standard,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Spartan => "spartan",
            Self::WarmMentor => "warm_mentor",
            Self::GameMaster => "game_master",
            Self::Standard => "standard",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Spartan => "Spartan",
            Self::WarmMentor => "Warm Mentor",
            Self::GameMaster => "Game Master",
            Self::Standard => "Coach",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Spartan => {
                "You are a Spartan drill-sergeant habit coach. Speak in short, blunt, demanding sentences. Accept no excuses, call out every skipped habit, and make tomorrow's mission tough but achievable."
            }
            Self::WarmMentor => {
                "You are a warm, patient mentor. Speak gently and encouragingly, acknowledge effort before results, and frame tomorrow's mission as a kind, small step forward."
            }
            Self::GameMaster => {
                "You are a game master narrating the user's day as an RPG quest log. Award XP for completed habits, describe skipped habits as unfinished quests, and present tomorrow's mission as a new quest with a reward."
            }
            Self::Standard => {
                "You are a balanced, supportive habit coach. Be honest about what went well and what did not, keep the tone friendly, and give practical, specific advice."
            }
        }
    }
}

impl From<String> for CoachPersona {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::CoachPersona;
    use std::collections::HashSet;

    #[test]
    fn every_persona_has_a_distinct_instruction() {
        let instructions = CoachPersona::ALL
            .iter()
            .map(|persona| persona.instruction())
            .collect::<HashSet<_>>();

        assert_eq!(instructions.len(), CoachPersona::ALL.len());
        assert!(instructions.iter().all(|text| !text.trim().is_empty()));
    }

    #[test]
    fn parses_aliases_and_korean_names() {
        assert_eq!(CoachPersona::parse("스파르타"), CoachPersona::Spartan);
        assert_eq!(CoachPersona::parse("따뜻한 멘토"), CoachPersona::WarmMentor);
        assert_eq!(CoachPersona::parse("Game-Master"), CoachPersona::GameMaster);
        assert_eq!(CoachPersona::parse(" WARM mentor "), CoachPersona::WarmMentor);
    }

    #[test]
    fn unknown_persona_falls_back_to_standard() {
        assert_eq!(CoachPersona::parse("pirate captain"), CoachPersona::Standard);
        assert_eq!(CoachPersona::parse(""), CoachPersona::Standard);

        let parsed: CoachPersona = serde_json::from_str("\"nobody\"").expect("deserialize");
        assert_eq!(parsed, CoachPersona::Standard);
    }

    #[test]
    fn key_round_trips_through_parse() {
        for persona in CoachPersona::ALL {
            assert_eq!(CoachPersona::parse(persona.key()), persona);
        }
    }
}

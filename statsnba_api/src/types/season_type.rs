use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Competition phase, as the API spells it in the `SeasonType` parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    #[default]
    #[serde(rename = "Regular Season")]
    RegularSeason,
    #[serde(rename = "Playoffs")]
    Playoffs,
    #[serde(rename = "Pre Season")]
    PreSeason,
    #[serde(rename = "All Star")]
    AllStar,
}

impl SeasonType {
    pub const ALL: [SeasonType; 4] = [
        SeasonType::RegularSeason,
        SeasonType::Playoffs,
        SeasonType::PreSeason,
        SeasonType::AllStar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::RegularSeason => "Regular Season",
            SeasonType::Playoffs => "Playoffs",
            SeasonType::PreSeason => "Pre Season",
            SeasonType::AllStar => "All Star",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown season type: {0}")]
pub struct ParseSeasonTypeError(pub String);

impl FromStr for SeasonType {
    type Err = ParseSeasonTypeError;

    /// Accepts the API spelling plus the common hyphenated/compact variants
    /// (`All-Star`, `regular`, `preseason`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "regularseason" | "regular" => Ok(SeasonType::RegularSeason),
            "playoffs" | "playoff" => Ok(SeasonType::Playoffs),
            "preseason" => Ok(SeasonType::PreSeason),
            "allstar" => Ok(SeasonType::AllStar),
            _ => Err(ParseSeasonTypeError(s.to_string())),
        }
    }
}

/// Whether a game log is keyed by team or by player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerOrTeam {
    Player,
    Team,
}

impl PlayerOrTeam {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerOrTeam::Player => "P",
            PlayerOrTeam::Team => "T",
        }
    }
}

//! Match schedule records supplied by the external prefill collaborator.
//!
//! Records are treated as opaque apart from the keys the team selector needs
//! (`comp_level`, `match_number`, `alliances.*.team_keys`); everything else is
//! kept verbatim in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Competition level of qualification matches.
pub const QUALIFICATION_LEVEL: &str = "qm";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    pub comp_level: String,
    pub match_number: u32,
    pub alliances: Alliances,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Alliances {
    #[serde(default)]
    pub red: Alliance,
    #[serde(default)]
    pub blue: Alliance,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Alliance {
    #[serde(default)]
    pub team_keys: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AllianceColor {
    Red,
    Blue,
}

impl AllianceColor {
    const fn prefix(self) -> char {
        match self {
            AllianceColor::Red => 'R',
            AllianceColor::Blue => 'B',
        }
    }
}

/// A selectable team for a given match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamOption {
    pub team_number: u32,
    /// `R1`..`R3` / `B1`..`B3`.
    pub robot_position: String,
    pub alliance: AllianceColor,
    /// 1-based slot within the alliance.
    pub position: usize,
}

/// Teams playing qualification match `match_number`, red alliance first.
///
/// Keys that do not parse as `frc<number>` are skipped. Returns an empty list if the
/// match is unknown.
pub fn team_options(matches: &[MatchRecord], match_number: u32) -> Vec<TeamOption> {
    let Some(record) = matches
        .iter()
        .find(|m| m.comp_level == QUALIFICATION_LEVEL && m.match_number == match_number)
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (color, alliance) in [
        (AllianceColor::Red, &record.alliances.red),
        (AllianceColor::Blue, &record.alliances.blue),
    ] {
        for (i, key) in alliance.team_keys.iter().enumerate() {
            let Some(team_number) = parse_team_key(key) else {
                continue;
            };
            out.push(TeamOption {
                team_number,
                robot_position: format!("{}{}", color.prefix(), i + 1),
                alliance: color,
                position: i + 1,
            });
        }
    }
    out
}

/// `"frc254"` -> `254`.
pub fn parse_team_key(key: &str) -> Option<u32> {
    key.strip_prefix("frc")?.parse().ok()
}

//! CSV population loader.
//!
//! # CSV format
//!
//! One row per agent.  Rows must be sorted by `agent_id`, starting at 0 with
//! no gaps, so that an agent's id doubles as its index everywhere else.
//!
//! ```csv
//! agent_id,username,role,expertise,work_intensity,hierarchy_level,seniority_respect,skill,stealth
//! 0,alice,sales,intermediate,1.3,1,false,,
//! 1,bob,management,expert,1.0,4,true,,
//! 2,mallory,adversary,advanced,1.0,1,false,advanced,true
//! ```
//!
//! Only the first three columns are required.  Missing or empty optional
//! columns take the [`AgentProfile::new`] defaults.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use org_core::{AgentId, Role};

use crate::{AgentError, AgentProfile, AgentResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PopulationRecord {
    agent_id:          u32,
    username:          String,
    role:              String,
    #[serde(default)]
    expertise:         Option<String>,
    #[serde(default)]
    work_intensity:    Option<f64>,
    #[serde(default)]
    hierarchy_level:   Option<u8>,
    #[serde(default)]
    seniority_respect: Option<bool>,
    #[serde(default)]
    skill:             Option<String>,
    #[serde(default)]
    stealth:           Option<bool>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load agent profiles from a CSV file.  See the module docs for the format.
pub fn load_population_csv(path: &Path) -> AgentResult<Vec<AgentProfile>> {
    let file = std::fs::File::open(path)?;
    load_population_reader(file)
}

/// Like [`load_population_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`).
pub fn load_population_reader<R: Read>(reader: R) -> AgentResult<Vec<AgentProfile>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut profiles = Vec::new();

    for result in csv_reader.deserialize::<PopulationRecord>() {
        let row = result.map_err(|e| AgentError::Parse(e.to_string()))?;

        let expected = AgentId(profiles.len() as u32);
        let found = AgentId(row.agent_id);
        if found != expected {
            return Err(AgentError::NonContiguousId { expected, found });
        }

        profiles.push(into_profile(row)?);
    }

    Ok(profiles)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn into_profile(row: PopulationRecord) -> AgentResult<AgentProfile> {
    let username = row.username.trim();
    if username.is_empty() {
        return Err(AgentError::Parse(format!("agent {} has an empty username", row.agent_id)));
    }
    let role: Role = row.role.parse()?;

    let mut profile = AgentProfile::new(AgentId(row.agent_id), username, role);

    if let Some(expertise) = non_empty(row.expertise) {
        profile.expertise = expertise.parse()?;
    }
    if let Some(skill) = non_empty(row.skill) {
        profile.skill = skill.parse()?;
    }
    if let Some(intensity) = row.work_intensity {
        if !intensity.is_finite() || intensity <= 0.0 {
            return Err(AgentError::Parse(format!(
                "agent {}: work_intensity must be finite and > 0, got {intensity}",
                row.agent_id
            )));
        }
        profile.work_intensity = intensity;
    }
    if let Some(level) = row.hierarchy_level {
        if !(1..=5).contains(&level) {
            return Err(AgentError::Parse(format!(
                "agent {}: hierarchy_level must be in 1..=5, got {level}",
                row.agent_id
            )));
        }
        profile.hierarchy_level = level;
    }
    profile.seniority_respect = row.seniority_respect.unwrap_or(false);
    profile.stealth = row.stealth.unwrap_or(false);

    Ok(profile)
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

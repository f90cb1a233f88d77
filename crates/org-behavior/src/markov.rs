//! Role-conditioned transition tables for benign agents.
//!
//! # CSV format
//!
//! ```csv
//! role,from_state,to_state,weight
//! sales,start,login,1.0
//! sales,login,search,0.6
//! sales,login,view_record,0.4
//! ```
//!
//! Weights are relative; they need not sum to 1.  Every role that appears in
//! the file must have a row leaving `start`.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use org_core::Role;

use crate::{BehaviorError, BehaviorResult, BenignState};

/// Weight of the idle self-break added to every working state.
pub const IDLE_WEIGHT: f64 = 0.08;

/// Weight of voluntary logout added to every working state.
pub const LOGOUT_WEIGHT: f64 = 0.04;

/// Outgoing edges of one state, in insertion order.
pub type TransitionRow = Vec<(BenignState, f64)>;

/// `(role, from) → [(to, weight)]`.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    rows: BTreeMap<(Role, BenignState), TransitionRow>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for every benign role: one shared state graph with
    /// role-specific emphasis on the states each department lives in.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for role in Role::BENIGN {
            for from in BenignState::ALL {
                let Some(base) = base_row(from) else { continue };
                let mut row: TransitionRow = base
                    .iter()
                    .map(|&(to, w)| (to, w * role_emphasis(role, to)))
                    .collect();
                if from != BenignState::Start {
                    row.push((BenignState::Idle, IDLE_WEIGHT));
                    row.push((BenignState::LoggedOut, LOGOUT_WEIGHT));
                }
                table.rows.insert((role, from), row);
            }
        }
        table
    }

    /// Outgoing edges for `(role, from)`, or `None` if the table has no row.
    pub fn row(&self, role: Role, from: BenignState) -> Option<&[(BenignState, f64)]> {
        self.rows.get(&(role, from)).map(Vec::as_slice)
    }

    /// Append one edge.
    ///
    /// # Errors
    ///
    /// `BehaviorError::Config` for a non-finite or negative weight, or an
    /// edge that already exists.
    pub fn insert(&mut self, role: Role, from: BenignState, to: BenignState, weight: f64) -> BehaviorResult<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(BehaviorError::Config(format!(
                "{role}: weight {from} -> {to} must be finite and >= 0, got {weight}"
            )));
        }
        let row = self.rows.entry((role, from)).or_default();
        if row.iter().any(|&(t, _)| t == to) {
            return Err(BehaviorError::Config(format!("{role}: duplicate edge {from} -> {to}")));
        }
        row.push((to, weight));
        Ok(())
    }

    /// Roles with at least one row.
    pub fn roles(&self) -> BTreeSet<Role> {
        self.rows.keys().map(|&(role, _)| role).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every role present can leave `Start`.
    pub fn validate(&self) -> BehaviorResult<()> {
        for role in self.roles() {
            if !self.rows.contains_key(&(role, BenignState::Start)) {
                return Err(BehaviorError::Config(format!("{role}: no transitions out of start")));
            }
        }
        Ok(())
    }
}

fn base_row(from: BenignState) -> Option<&'static [(BenignState, f64)]> {
    use BenignState::*;
    let row: &'static [(BenignState, f64)] = match from {
        Start          => &[(Login, 1.0)],
        Login          => &[(Search, 0.45), (ViewRecord, 0.30), (GenerateReport, 0.10), (CreateRecord, 0.10)],
        Search         => &[(ViewRecord, 0.45), (Search, 0.20), (UpdateRecord, 0.10), (CreateRecord, 0.10), (ExportData, 0.05)],
        ViewRecord     => &[
            (Search, 0.30), (UpdateRecord, 0.20), (ViewRecord, 0.15),
            (CreateRecord, 0.10), (DeleteRecord, 0.05), (GenerateReport, 0.05),
        ],
        CreateRecord   => &[(ViewRecord, 0.35), (Search, 0.30), (CreateRecord, 0.15)],
        UpdateRecord   => &[(ViewRecord, 0.35), (Search, 0.30), (UpdateRecord, 0.15)],
        DeleteRecord   => &[(Search, 0.50), (ViewRecord, 0.30)],
        GenerateReport => &[(ExportData, 0.30), (Search, 0.30), (GenerateReport, 0.15), (ViewRecord, 0.15)],
        ExportData     => &[(Search, 0.45), (GenerateReport, 0.25), (ViewRecord, 0.20)],
        Idle           => &[(Search, 0.40), (ViewRecord, 0.30), (GenerateReport, 0.10)],
        OperatorError  => &[(Search, 0.50), (ViewRecord, 0.30)],
        LoggedOut      => return None,
    };
    Some(row)
}

fn role_emphasis(role: Role, to: BenignState) -> f64 {
    use BenignState::*;
    match (role, to) {
        (Role::Sales, CreateRecord)         => 1.5,
        (Role::Sales, Search)               => 1.2,
        (Role::Hr, UpdateRecord)            => 1.4,
        (Role::Hr, ViewRecord)              => 1.2,
        (Role::Finance, GenerateReport)     => 1.8,
        (Role::Finance, ExportData)         => 1.3,
        (Role::Engineering, Search)         => 1.3,
        (Role::Engineering, UpdateRecord)   => 1.3,
        (Role::Support, ViewRecord)         => 1.3,
        (Role::Support, UpdateRecord)       => 1.4,
        (Role::Management, GenerateReport)  => 2.0,
        (Role::Management, DeleteRecord)    => 0.5,
        (Role::ItAdmin, DeleteRecord)       => 1.5,
        (Role::ItAdmin, UpdateRecord)       => 1.3,
        _ => 1.0,
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TransitionRecord {
    role:       String,
    from_state: String,
    to_state:   String,
    weight:     f64,
}

/// Load a transition table from a CSV file.  See the module docs for the format.
pub fn load_transitions_csv(path: &Path) -> BehaviorResult<TransitionTable> {
    let file = std::fs::File::open(path)?;
    load_transitions_reader(file)
}

/// Like [`load_transitions_csv`] but accepts any `Read` source.
pub fn load_transitions_reader<R: Read>(reader: R) -> BehaviorResult<TransitionTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut table = TransitionTable::new();

    for result in csv_reader.deserialize::<TransitionRecord>() {
        let row = result.map_err(|e| BehaviorError::Parse(e.to_string()))?;
        let role: Role = row.role.parse()?;
        if role.is_adversarial() {
            return Err(BehaviorError::Config(format!(
                "transition rows are for benign roles only, got {role}"
            )));
        }
        let from: BenignState = row.from_state.parse()?;
        let to: BenignState = row.to_state.parse()?;
        table.insert(role, from, to, row.weight)?;
    }

    table.validate()?;
    Ok(table)
}

/// Merge `overrides` over `base`: any `(role, from)` row present in
/// `overrides` replaces the base row wholesale.
pub fn merge_tables(mut base: TransitionTable, overrides: TransitionTable) -> TransitionTable {
    base.rows.extend(overrides.rows);
    base
}

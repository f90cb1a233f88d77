//! Benign state-machine nodes.

use std::fmt;
use std::str::FromStr;

use crate::BehaviorError;

/// One node of the benign employee state machine.
///
/// `Start` and `LoggedOut` are session boundaries, never emitted as work.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum BenignState {
    Start,
    Login,
    Search,
    ViewRecord,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    GenerateReport,
    ExportData,
    Idle,
    OperatorError,
    LoggedOut,
}

impl BenignState {
    pub const ALL: [BenignState; 12] = [
        BenignState::Start,
        BenignState::Login,
        BenignState::Search,
        BenignState::ViewRecord,
        BenignState::CreateRecord,
        BenignState::UpdateRecord,
        BenignState::DeleteRecord,
        BenignState::GenerateReport,
        BenignState::ExportData,
        BenignState::Idle,
        BenignState::OperatorError,
        BenignState::LoggedOut,
    ];

    /// `false` for the session-boundary placeholders.
    #[inline]
    pub fn is_actionable(self) -> bool {
        !matches!(self, BenignState::Start | BenignState::LoggedOut)
    }

    /// States whose transition weight scales with the agent's work intensity.
    #[inline]
    pub fn is_high_engagement(self) -> bool {
        matches!(
            self,
            BenignState::CreateRecord
                | BenignState::UpdateRecord
                | BenignState::GenerateReport
                | BenignState::ExportData
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BenignState::Start          => "start",
            BenignState::Login          => "login",
            BenignState::Search         => "search",
            BenignState::ViewRecord     => "view_record",
            BenignState::CreateRecord   => "create_record",
            BenignState::UpdateRecord   => "update_record",
            BenignState::DeleteRecord   => "delete_record",
            BenignState::GenerateReport => "generate_report",
            BenignState::ExportData     => "export_data",
            BenignState::Idle           => "idle",
            BenignState::OperatorError  => "operator_error",
            BenignState::LoggedOut      => "logged_out",
        }
    }
}

impl FromStr for BenignState {
    type Err = BehaviorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        BenignState::ALL
            .into_iter()
            .find(|state| state.as_str() == needle)
            .ok_or_else(|| BehaviorError::Parse(format!("unknown state {s:?}")))
    }
}

impl fmt::Display for BenignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Organizational role tags shared by every crate.
//!
//! The benign roles drive per-role shift windows, permissions and transition
//! tables.  `Adversary` is the single adversarial tag; adversaries are
//! scheduled by an independent, looser policy.

use std::fmt;
use std::str::FromStr;

use crate::OrgError;

/// The role an agent plays in the simulated organization.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    Sales,
    Hr,
    Finance,
    Engineering,
    Support,
    Management,
    /// IT administrators; keep on-call activity outside their shift.
    ItAdmin,
    /// An adversarial actor (external attacker or malicious insider).
    Adversary,
}

impl Role {
    /// Every benign role, in declaration order.
    pub const BENIGN: [Role; 7] = [
        Role::Sales,
        Role::Hr,
        Role::Finance,
        Role::Engineering,
        Role::Support,
        Role::Management,
        Role::ItAdmin,
    ];

    #[inline]
    pub fn is_adversarial(self) -> bool {
        matches!(self, Role::Adversary)
    }

    /// Lower-case label used in CSV config files and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Sales       => "sales",
            Role::Hr          => "hr",
            Role::Finance     => "finance",
            Role::Engineering => "engineering",
            Role::Support     => "support",
            Role::Management  => "management",
            Role::ItAdmin     => "it_admin",
            Role::Adversary   => "adversary",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OrgError;

    /// Case-insensitive; accepts `it-admin` as well as `it_admin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sales"       => Ok(Role::Sales),
            "hr"          => Ok(Role::Hr),
            "finance"     => Ok(Role::Finance),
            "engineering" => Ok(Role::Engineering),
            "support"     => Ok(Role::Support),
            "management"  => Ok(Role::Management),
            "it_admin"    => Ok(Role::ItAdmin),
            "adversary"   => Ok(Role::Adversary),
            other => Err(OrgError::Parse(format!("unknown role {other:?}"))),
        }
    }
}

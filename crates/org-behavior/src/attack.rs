//! The attack-chain library.
//!
//! Every chain is an ordered, fixed list of [`AttackStep`]s and is tied to
//! exactly one [`BypassTechnique`].  Detection bookkeeping on the adversary is
//! therefore keyed by technique, and "the chain has been detected" means "its
//! technique has been detected".
//!
//! | Chain                 | Technique            | Targets      |
//! |-----------------------|----------------------|--------------|
//! | `InjectionProbe`      | `SqlInjection`       | any resource |
//! | `CredentialStuffing`  | `CredentialReuse`    | any resource |
//! | `PrivilegeEscalation` | `PrivilegeAbuse`     | high-value   |
//! | `DataTampering`       | `CommentObfuscation` | any resource |
//! | `SlowExfiltration`    | `SlowDrip`           | high-value   |
//! | `SchemaDiscovery`     | `EncodingEvasion`    | any resource |

use std::fmt;

// ── AttackStep ────────────────────────────────────────────────────────────────

/// One stage of an attack chain.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum AttackStep {
    Reconnaissance,
    EnumerateSchema,
    EnumeratePermissions,
    LoginAttempt,
    ProbeInjection,
    UnionExtract,
    EscalatePrivilege,
    BulkRead,
    TrickleRead,
    TamperRecords,
    Exfiltrate,
    CoverTracks,
}

impl AttackStep {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackStep::Reconnaissance       => "reconnaissance",
            AttackStep::EnumerateSchema      => "enumerate_schema",
            AttackStep::EnumeratePermissions => "enumerate_permissions",
            AttackStep::LoginAttempt         => "login_attempt",
            AttackStep::ProbeInjection       => "probe_injection",
            AttackStep::UnionExtract         => "union_extract",
            AttackStep::EscalatePrivilege    => "escalate_privilege",
            AttackStep::BulkRead             => "bulk_read",
            AttackStep::TrickleRead          => "trickle_read",
            AttackStep::TamperRecords        => "tamper_records",
            AttackStep::Exfiltrate           => "exfiltrate",
            AttackStep::CoverTracks          => "cover_tracks",
        }
    }

    /// Simulated minutes an attacker typically waits after this step.
    pub fn base_wait_minutes(self) -> f64 {
        match self {
            AttackStep::LoginAttempt         => 1.0,
            AttackStep::ProbeInjection       => 2.0,
            AttackStep::EnumerateSchema      => 3.0,
            AttackStep::UnionExtract         => 3.0,
            AttackStep::Reconnaissance       => 4.0,
            AttackStep::EnumeratePermissions => 4.0,
            AttackStep::CoverTracks          => 4.0,
            AttackStep::EscalatePrivilege    => 5.0,
            AttackStep::TamperRecords        => 5.0,
            AttackStep::BulkRead             => 6.0,
            AttackStep::Exfiltrate           => 8.0,
            AttackStep::TrickleRead          => 10.0,
        }
    }
}

impl fmt::Display for AttackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── BypassTechnique ───────────────────────────────────────────────────────────

/// The evasion technique a chain relies on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum BypassTechnique {
    SqlInjection,
    CredentialReuse,
    PrivilegeAbuse,
    CommentObfuscation,
    SlowDrip,
    EncodingEvasion,
}

impl BypassTechnique {
    /// Techniques restricted to the catalog's high-value resources.
    #[inline]
    pub fn targets_high_value(self) -> bool {
        matches!(self, BypassTechnique::PrivilegeAbuse | BypassTechnique::SlowDrip)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BypassTechnique::SqlInjection       => "sql_injection",
            BypassTechnique::CredentialReuse    => "credential_reuse",
            BypassTechnique::PrivilegeAbuse     => "privilege_abuse",
            BypassTechnique::CommentObfuscation => "comment_obfuscation",
            BypassTechnique::SlowDrip           => "slow_drip",
            BypassTechnique::EncodingEvasion    => "encoding_evasion",
        }
    }
}

impl fmt::Display for BypassTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── AttackChain ───────────────────────────────────────────────────────────────

/// A named, ordered attack playbook.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum AttackChain {
    InjectionProbe,
    CredentialStuffing,
    PrivilegeEscalation,
    DataTampering,
    SlowExfiltration,
    SchemaDiscovery,
}

impl AttackChain {
    pub const ALL: [AttackChain; 6] = [
        AttackChain::InjectionProbe,
        AttackChain::CredentialStuffing,
        AttackChain::PrivilegeEscalation,
        AttackChain::DataTampering,
        AttackChain::SlowExfiltration,
        AttackChain::SchemaDiscovery,
    ];

    /// The chain's steps in execution order.  Never empty.
    pub fn steps(self) -> &'static [AttackStep] {
        use AttackStep::*;
        match self {
            AttackChain::InjectionProbe      => &[Reconnaissance, ProbeInjection, UnionExtract, Exfiltrate],
            AttackChain::CredentialStuffing  => &[Reconnaissance, LoginAttempt, LoginAttempt, BulkRead],
            AttackChain::PrivilegeEscalation => &[
                Reconnaissance, EnumeratePermissions, EscalatePrivilege, BulkRead, Exfiltrate,
            ],
            AttackChain::DataTampering       => &[Reconnaissance, TamperRecords, CoverTracks],
            AttackChain::SlowExfiltration    => &[Reconnaissance, TrickleRead, TrickleRead, TrickleRead, Exfiltrate],
            AttackChain::SchemaDiscovery     => &[EnumerateSchema, ProbeInjection, CoverTracks],
        }
    }

    pub fn technique(self) -> BypassTechnique {
        match self {
            AttackChain::InjectionProbe      => BypassTechnique::SqlInjection,
            AttackChain::CredentialStuffing  => BypassTechnique::CredentialReuse,
            AttackChain::PrivilegeEscalation => BypassTechnique::PrivilegeAbuse,
            AttackChain::DataTampering       => BypassTechnique::CommentObfuscation,
            AttackChain::SlowExfiltration    => BypassTechnique::SlowDrip,
            AttackChain::SchemaDiscovery     => BypassTechnique::EncodingEvasion,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttackChain::InjectionProbe      => "injection_probe",
            AttackChain::CredentialStuffing  => "credential_stuffing",
            AttackChain::PrivilegeEscalation => "privilege_escalation",
            AttackChain::DataTampering       => "data_tampering",
            AttackChain::SlowExfiltration    => "slow_exfiltration",
            AttackChain::SchemaDiscovery     => "schema_discovery",
        }
    }
}

impl fmt::Display for AttackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Complexity tiers and the query shape each one allows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Five ordered complexity levels.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple   = 1,
    Basic    = 2,
    Moderate = 3,
    Complex  = 4,
    Advanced = 5,
}

impl ComplexityTier {
    pub const ALL: [ComplexityTier; 5] = [
        ComplexityTier::Simple,
        ComplexityTier::Basic,
        ComplexityTier::Moderate,
        ComplexityTier::Complex,
        ComplexityTier::Advanced,
    ];

    pub const MIN: ComplexityTier = ComplexityTier::Simple;
    pub const MAX: ComplexityTier = ComplexityTier::Advanced;

    #[inline]
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level).checked_sub(1)?).copied()
    }

    /// One tier up, saturating at `Advanced`.
    pub fn up(self) -> Self {
        Self::from_level(self.level() + 1).unwrap_or(Self::MAX)
    }

    /// One tier down, saturating at `Simple`.
    pub fn down(self) -> Self {
        Self::from_level(self.level().saturating_sub(1)).unwrap_or(Self::MIN)
    }

    /// The generation limits of this tier.
    pub fn strategy(self) -> GenerationStrategy {
        let (max_tables, max_joins, allow_subquery, allow_aggregation, allow_window, allow_cte, max_predicates) =
            match self {
                ComplexityTier::Simple   => (1, 0, false, false, false, false, 2),
                ComplexityTier::Basic    => (2, 1, false, true,  false, false, 3),
                ComplexityTier::Moderate => (3, 2, true,  true,  false, false, 4),
                ComplexityTier::Complex  => (4, 3, true,  true,  true,  false, 6),
                ComplexityTier::Advanced => (6, 5, true,  true,  true,  true,  8),
            };
        GenerationStrategy {
            tier: self,
            max_tables,
            max_joins,
            allow_subquery,
            allow_aggregation,
            allow_window,
            allow_cte,
            max_predicates,
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComplexityTier::Simple   => "simple",
            ComplexityTier::Basic    => "basic",
            ComplexityTier::Moderate => "moderate",
            ComplexityTier::Complex  => "complex",
            ComplexityTier::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

/// Upper bounds the translator must respect when shaping a query.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GenerationStrategy {
    pub tier:              ComplexityTier,
    pub max_tables:        u8,
    pub max_joins:         u8,
    pub allow_subquery:    bool,
    pub allow_aggregation: bool,
    pub allow_window:      bool,
    pub allow_cte:         bool,
    pub max_predicates:    u8,
}

impl GenerationStrategy {
    /// `true` if every allowance of `self` is at most that of `other`.
    pub fn is_within(&self, other: &GenerationStrategy) -> bool {
        self.max_tables <= other.max_tables
            && self.max_joins <= other.max_joins
            && (!self.allow_subquery || other.allow_subquery)
            && (!self.allow_aggregation || other.allow_aggregation)
            && (!self.allow_window || other.allow_window)
            && (!self.allow_cte || other.allow_cte)
            && self.max_predicates <= other.max_predicates
    }
}

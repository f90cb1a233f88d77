//! Weighted factor scoring, tier bucketing, and the adaptive nudge.
//!
//! # Scoring
//!
//!   score = w_e·expertise + w_b·business + w_t·temporal + w_c·cultural
//!
//! The score is bucketed by four ascending thresholds into the five tiers.
//! A degraded database snapshot caps the tier at `Moderate`; a snapshot that
//! knows its tables caps `max_tables`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use org_feedback::DatabaseState;

use crate::context::QueryContext;
use crate::factors::{
    business_factor, cultural_factor, expertise_factor, temporal_factor, FactorBreakdown,
};
use crate::tier::{ComplexityTier, GenerationStrategy};
use crate::window::SuccessWindow;
use crate::{ComplexityError, ComplexityResult};

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub expertise: f64,
    pub business:  f64,
    pub temporal:  f64,
    pub cultural:  f64,
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.expertise + self.business + self.temporal + self.cultural
    }

    fn apply(&self, f: &FactorBreakdown) -> f64 {
        self.expertise * f.expertise
            + self.business * f.business
            + self.temporal * f.temporal
            + self.cultural * f.cultural
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self { expertise: 0.4, business: 0.3, temporal: 0.2, cultural: 0.1 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub weights:    FactorWeights,

    /// Lower bounds of `Basic`, `Moderate`, `Complex` and `Advanced`.
    pub thresholds: [f64; 4],

    /// Success rate above which the tier is nudged up.
    pub promote_above: f64,
    /// Success rate below which the tier is nudged down.
    pub demote_below:  f64,

    /// Rolling latency above this marks the database degraded.
    pub slow_latency_ms:   f64,
    /// Fraction of slow queries above this marks the database degraded.
    pub max_slow_fraction: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            weights:           FactorWeights::default(),
            thresholds:        [0.2, 0.4, 0.6, 0.8],
            promote_above:     0.9,
            demote_below:      0.6,
            slow_latency_ms:   1_000.0,
            max_slow_fraction: 0.3,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ComplexityResult<()> {
        let w = &self.weights;
        let parts = [w.expertise, w.business, w.temporal, w.cultural];
        if parts.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(ComplexityError::Config(format!("weights must be finite and >= 0: {w:?}")));
        }
        if (w.sum() - 1.0).abs() > 1e-6 {
            return Err(ComplexityError::Config(format!("weights must sum to 1, got {}", w.sum())));
        }
        if self.thresholds.iter().any(|t| !t.is_finite())
            || self.thresholds.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Err(ComplexityError::Config(format!(
                "thresholds must be strictly increasing: {:?}",
                self.thresholds
            )));
        }
        let rates_ok = (0.0..=1.0).contains(&self.demote_below)
            && (0.0..=1.0).contains(&self.promote_above)
            && self.demote_below <= self.promote_above;
        if !rates_ok {
            return Err(ComplexityError::Config(format!(
                "need 0 <= demote_below ({}) <= promote_above ({}) <= 1",
                self.demote_below, self.promote_above
            )));
        }
        if !self.slow_latency_ms.is_finite() || self.slow_latency_ms <= 0.0 {
            return Err(ComplexityError::Config("slow_latency_ms must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.max_slow_fraction) {
            return Err(ComplexityError::Config("max_slow_fraction must be in [0, 1]".into()));
        }
        Ok(())
    }
}

// ── Assessment ────────────────────────────────────────────────────────────────

/// Outcome of one `assess` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score:         f64,
    pub tier:          ComplexityTier,
    pub strategy:      GenerationStrategy,
    pub factors:       FactorBreakdown,
    /// The database-health cap lowered the tier.
    pub health_capped: bool,
}

impl Assessment {
    /// What a caller uses when `assess` fails: the `Simple` strategy.
    pub fn fallback() -> Self {
        Self {
            score:         0.0,
            tier:          ComplexityTier::Simple,
            strategy:      ComplexityTier::Simple.strategy(),
            factors:       FactorBreakdown::default(),
            health_capped: false,
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Stateless scorer.  Shared read-only by every worker.
#[derive(Clone, Debug, Default)]
pub struct ComplexityController {
    config: ControllerConfig,
}

impl ComplexityController {
    pub fn new(config: ControllerConfig) -> ComplexityResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Score `ctx` and pick the tier and strategy.
    ///
    /// # Errors
    ///
    /// `ComplexityError::InvalidContext` for NaN or out-of-range inputs.
    pub fn assess(&self, ctx: &QueryContext) -> ComplexityResult<Assessment> {
        let (score, factors) = self.score(ctx)?;
        let tier = self.tier_for(score);
        Ok(self.finish(ctx, score, factors, tier))
    }

    /// Like [`assess`](Self::assess), then nudged by the agent's recent
    /// success rate.  An empty window leaves the tier unchanged.
    pub fn assess_with_history(
        &self,
        ctx: &QueryContext,
        window: &SuccessWindow,
    ) -> ComplexityResult<Assessment> {
        let (score, factors) = self.score(ctx)?;
        let mut tier = self.tier_for(score);
        if let Some(rate) = window.rate() {
            tier = self.adapt(tier, rate);
        }
        Ok(self.finish(ctx, score, factors, tier))
    }

    /// Bucket a score into a tier.
    pub fn tier_for(&self, score: f64) -> ComplexityTier {
        let bucket = self.config.thresholds.iter().filter(|&&t| score >= t).count();
        ComplexityTier::ALL[bucket]
    }

    /// Move `assessed` one level toward the success rate.  Depends only on
    /// its inputs, so repeated calls with the same values agree.  A NaN rate
    /// leaves the tier unchanged.
    pub fn adapt(&self, assessed: ComplexityTier, success_rate: f64) -> ComplexityTier {
        if success_rate > self.config.promote_above {
            assessed.up()
        } else if success_rate < self.config.demote_below {
            assessed.down()
        } else {
            assessed
        }
    }

    /// `true` if `state` is slow enough to cap the tier.
    pub fn is_degraded(&self, state: &DatabaseState) -> bool {
        state.avg_latency_ms() > self.config.slow_latency_ms
            || state.slow_fraction() > self.config.max_slow_fraction
    }

    fn score(&self, ctx: &QueryContext) -> ComplexityResult<(f64, FactorBreakdown)> {
        validate_context(ctx)?;
        let factors = FactorBreakdown {
            expertise: expertise_factor(&ctx.user),
            business:  business_factor(&ctx.business),
            temporal:  temporal_factor(&ctx.temporal),
            cultural:  cultural_factor(&ctx.cultural),
        };
        let score = self.config.weights.apply(&factors).clamp(0.0, 1.0);
        Ok((score, factors))
    }

    fn finish(
        &self,
        ctx: &QueryContext,
        score: f64,
        factors: FactorBreakdown,
        mut tier: ComplexityTier,
    ) -> Assessment {
        let mut health_capped = false;
        if let Some(db) = ctx.database.as_deref() {
            if self.is_degraded(db) && tier > ComplexityTier::Moderate {
                tier = ComplexityTier::Moderate;
                health_capped = true;
            }
        }

        let mut strategy = tier.strategy();
        if let Some(db) = ctx.database.as_deref() {
            let known = db.known_tables();
            if known > 0 {
                let cap = u8::try_from(known).unwrap_or(u8::MAX).max(1);
                strategy.max_tables = strategy.max_tables.min(cap);
                strategy.max_joins = strategy.max_joins.min(strategy.max_tables.saturating_sub(1));
            }
        }

        debug!(
            role = %ctx.user.role,
            score,
            tier = %tier,
            health_capped,
            "complexity assessed"
        );
        Assessment { score, tier, strategy, factors, health_capped }
    }
}

fn validate_context(ctx: &QueryContext) -> ComplexityResult<()> {
    let unit = |x: f64| (0.0..=1.0).contains(&x);
    if !unit(ctx.user.stress) {
        return Err(ComplexityError::InvalidContext(format!(
            "stress must be in [0, 1], got {}",
            ctx.user.stress
        )));
    }
    if !unit(ctx.temporal.activity_intensity) {
        return Err(ComplexityError::InvalidContext(format!(
            "activity intensity must be in [0, 1], got {}",
            ctx.temporal.activity_intensity
        )));
    }
    if ctx.temporal.hour >= 24 {
        return Err(ComplexityError::InvalidContext(format!("hour {} out of range", ctx.temporal.hour)));
    }
    if !(1..=5).contains(&ctx.cultural.hierarchy_level) {
        return Err(ComplexityError::InvalidContext(format!(
            "hierarchy level {} outside 1..=5",
            ctx.cultural.hierarchy_level
        )));
    }
    Ok(())
}

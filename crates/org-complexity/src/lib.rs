//! `org-complexity`: picks how complicated the next query may be.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`context`]    | `QueryContext` and its user/business/temporal/cultural parts |
//! | [`factors`]    | The four factor functions, `FactorBreakdown`               |
//! | [`tier`]       | `ComplexityTier`, `GenerationStrategy`                     |
//! | [`controller`] | `ComplexityController`, `ControllerConfig`, `Assessment`   |
//! | [`window`]     | `SuccessWindow` (rolling per-agent outcomes)               |
//! | [`error`]      | `ComplexityError`, `ComplexityResult<T>`                   |

pub mod context;
pub mod controller;
pub mod error;
pub mod factors;
pub mod tier;
pub mod window;


pub use context::{
    BusinessContext, BusinessEvent, CulturalContext, DataSensitivity, QueryContext,
    TemporalContext, UserContext, WorkflowType,
};
pub use controller::{Assessment, ComplexityController, ControllerConfig, FactorWeights};
pub use error::{ComplexityError, ComplexityResult};
pub use factors::FactorBreakdown;
pub use tier::{ComplexityTier, GenerationStrategy};
pub use window::{SuccessWindow, DEFAULT_WINDOW};

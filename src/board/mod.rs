pub mod bindings;
pub mod error;
pub mod input;
pub mod model;
pub mod overlay;
pub mod service;
pub mod session;
pub mod state;
pub mod surface;
pub mod wire;

pub use error::{EvaluateError, EvaluateResult};
pub use overlay::{LogTypesetter, RenderedResult, Typesetter};
pub use service::{EvaluationService, HttpEvaluationService};
pub use session::{BoardSession, EvaluateOutcome, SessionConfig, SkipReason, TickReport};

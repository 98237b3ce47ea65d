pub mod context;
pub mod decision;
pub mod evaluator;
pub mod live;

pub use context::DecisionContext;
pub use decision::decide;
pub use evaluator::Evaluator;
pub use live::{evaluate_as_of, evaluate_latest, LiveDecision};

//! Domain evaluation: additive card/deck strength scoring, feature-set
//! extraction for the learned-model path, and the manual fallback evaluator.

mod eval;
mod features;
mod strengths;

pub use eval::*;
pub use features::*;
pub use strengths::*;

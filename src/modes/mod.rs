pub mod evaluate;
pub mod train;
pub mod visualize;

pub use evaluate::{EvalReport, EvaluateConfig, EvaluateMode};
pub use train::{TrainConfig, TrainMode};
pub use visualize::VisualizeMode;

pub mod history;
pub mod training_stats;

pub use history::{EvalPoint, RewardHistory, TrainPoint};
pub use training_stats::TrainingStats;

//! Reward history persisted alongside checkpoints
//!
//! Records mean training reward and held-out evaluation results over the
//! course of a run, indexed by environment steps, and saves them as JSON so a
//! run can be inspected (or resumed and appended to) later.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One training-reward sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrainPoint {
    /// Environment steps completed when the sample was taken
    pub env_steps: usize,
    /// Mean episode reward over the recent window
    pub mean_reward: f32,
}

/// One held-out evaluation sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EvalPoint {
    /// Environment steps completed when the evaluation ran
    pub env_steps: usize,
    /// Mean episode reward over the evaluation episodes
    pub mean_reward: f32,
    /// Fraction of evaluation episodes that reached the goal
    pub success_rate: f32,
}

/// Time series of training and evaluation rewards for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardHistory {
    pub train: Vec<TrainPoint>,
    pub eval: Vec<EvalPoint>,
}

impl RewardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a training-reward sample
    pub fn push_train(&mut self, env_steps: usize, mean_reward: f32) {
        self.train.push(TrainPoint {
            env_steps,
            mean_reward,
        });
    }

    /// Append a held-out evaluation sample
    pub fn push_eval(&mut self, env_steps: usize, mean_reward: f32, success_rate: f32) {
        self.eval.push(EvalPoint {
            env_steps,
            mean_reward,
            success_rate,
        });
    }

    /// Save the history as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize history")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write history to {:?}", path))?;
        Ok(())
    }

    /// Load a previously saved history
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history from {:?}", path))?;
        serde_json::from_str(&json).context("Failed to deserialize history")
    }
}

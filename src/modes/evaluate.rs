//! Evaluation mode for scoring trained agents
//!
//! Loads a trained model and runs the greedy policy over a batch of held-out
//! levels, reporting mean reward, success rate, and episode statistics. The
//! held-out seed range starts immediately after the training range recorded
//! in the model metadata, so no evaluated level was seen during training.

use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn::tensor::{Tensor, activation::softmax, backend::Backend};
use std::path::PathBuf;

use crate::game::LevelSet;
use crate::rl::{ActorCriticNetwork, GridEnvironment, load_network};

/// Configuration for evaluation mode
#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    /// Path to the saved model
    pub model_path: PathBuf,

    /// Number of episodes to run
    pub episodes: usize,

    /// Number of held-out level seeds to evaluate on
    pub eval_levels: u64,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/gridrun.mpk"),
            episodes: 100,
            eval_levels: 50,
        }
    }
}

/// Aggregate results of an evaluation run
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub episodes: usize,
    pub mean_reward: f32,
    pub mean_length: f32,
    pub mean_coins: f32,
    pub success_rate: f32,
}

/// Evaluation mode executor
pub struct EvaluateMode<B: Backend> {
    network: ActorCriticNetwork<B>,
    env: GridEnvironment<B>,
    levels: LevelSet,
    config: EvaluateConfig,
}

impl<B: Backend> EvaluateMode<B> {
    /// Load a trained model and set up the held-out environment
    pub fn new(config: EvaluateConfig, device: B::Device) -> Result<Self> {
        use burn::backend::Autodiff;
        let (network, metadata) = load_network::<Autodiff<B>>(&config.model_path, &device)
            .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;
        let network = network.valid();

        // Replay the exact environment the agent trained in
        let levels = metadata.levels.held_out(config.eval_levels);
        let env = GridEnvironment::new(metadata.game_config.clone(), levels, device);

        println!("Evaluating {:?}", config.model_path);
        println!(
            "Trained: {} updates, {} env steps on {}",
            metadata.updates, metadata.env_steps, metadata.levels
        );
        println!("Evaluation levels: {}", levels);
        println!();

        Ok(Self {
            network,
            env,
            levels,
            config,
        })
    }

    /// Run the evaluation and print a summary
    pub fn run(&mut self) -> Result<EvalReport> {
        let mut total_reward = 0.0;
        let mut total_length = 0usize;
        let mut total_coins = 0u32;
        let mut successes = 0usize;

        for episode in 0..self.config.episodes {
            let reward = if self.levels.num_levels > 0 {
                // Cycle through the held-out seeds deterministically
                let seed =
                    self.levels.start_level + (episode as u64 % self.levels.num_levels);
                self.run_episode(Some(seed))
            } else {
                self.run_episode(None)
            };

            total_reward += reward;
            let state = self.env.state();
            total_length += state.steps as usize;
            total_coins += state.score;
            if state.reached_goal {
                successes += 1;
            }
        }

        let n = self.config.episodes as f32;
        let report = EvalReport {
            episodes: self.config.episodes,
            mean_reward: total_reward / n,
            mean_length: total_length as f32 / n,
            mean_coins: total_coins as f32 / n,
            success_rate: successes as f32 / n,
        };

        println!(
            "Episodes: {} | Reward: {:.2} | Solved: {:.1}% | Length: {:.1} | Coins: {:.2}",
            report.episodes,
            report.mean_reward,
            report.success_rate * 100.0,
            report.mean_length,
            report.mean_coins,
        );

        Ok(report)
    }

    /// Run a single greedy episode, returning the total reward
    fn run_episode(&mut self, seed: Option<u64>) -> f32 {
        let mut observation = match seed {
            Some(seed) => self.env.reset_to(seed),
            None => self.env.reset(),
        };
        let mut episode_reward = 0.0;

        loop {
            let action = greedy_action(&self.network, observation);
            let (next_observation, reward, done) = self.env.step(action);
            episode_reward += reward;
            observation = next_observation;

            if done {
                return episode_reward;
            }
        }
    }
}

/// Select the highest-probability action for an observation
fn greedy_action<B: Backend>(
    network: &ActorCriticNetwork<B>,
    observation: Tensor<B, 3>,
) -> usize {
    let obs_batch = observation.unsqueeze_dim(0);
    let (action_logits, _value) = network.forward(obs_batch);

    let probs = softmax(action_logits, 1);
    let probs_vec: Vec<f32> = probs
        .into_data()
        .to_vec()
        .expect("Failed to convert probs to vec");

    probs_vec
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

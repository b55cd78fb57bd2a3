//! Training mode for the PPO agent
//!
//! Runs the full training loop: vectorized rollout collection, PPO updates,
//! periodic evaluation on held-out levels, and checkpointing. Progress is
//! printed to the console as training proceeds.

use crate::game::{GameConfig, LevelSet};
use crate::metrics::{RewardHistory, TrainingStats};
use crate::rl::{
    ActorCriticConfig, GridEnvironment, NUM_OBS_CHANNELS, PPOAgent, PPOConfig, VecEnvironment,
    save_model,
};
use anyhow::{Context, Result};
use burn::tensor::{Tensor, backend::AutodiffBackend};
use std::path::PathBuf;

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Total environment steps to train for (summed across all envs)
    pub total_steps: usize,

    /// Environment steps between evaluation runs on held-out levels
    pub eval_interval: usize,

    /// Number of episodes per evaluation run
    pub eval_episodes: usize,

    /// Environment steps between checkpoint saves
    pub checkpoint_interval: usize,

    /// Updates between progress printouts
    pub log_frequency: usize,

    /// Path to save the trained model
    pub save_path: PathBuf,

    /// Level seeds to train on
    pub levels: LevelSet,

    /// Number of held-out level seeds for evaluation
    pub eval_levels: u64,

    /// Game configuration
    pub game_config: GameConfig,

    /// PPO hyperparameters
    pub ppo_config: PPOConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            total_steps: 25_000_000,
            eval_interval: 200_000,
            eval_episodes: 16,
            checkpoint_interval: 1_000_000,
            log_frequency: 1,
            save_path: PathBuf::from("models/gridrun.mpk"),
            levels: LevelSet::default(),
            eval_levels: 50,
            game_config: GameConfig::default(),
            ppo_config: PPOConfig::default(),
        }
    }
}

/// Training mode executor
pub struct TrainMode<B: AutodiffBackend> {
    agent: PPOAgent<B>,
    env: VecEnvironment<B::InnerBackend>,
    eval_env: GridEnvironment<B::InnerBackend>,
    stats: TrainingStats,
    history: RewardHistory,
    config: TrainConfig,
    env_steps: usize,
    updates: usize,
}

impl<B: AutodiffBackend> TrainMode<B> {
    /// Create a new training mode instance
    pub fn new(config: TrainConfig, device: B::Device) -> Result<Self> {
        config
            .ppo_config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid PPO configuration: {}", e))?;
        config
            .game_config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid game configuration: {}", e))?;

        let height = config.game_config.grid_height;
        let width = config.game_config.grid_width;

        let network_config = ActorCriticConfig::new(height, width, config.ppo_config.encoder);
        let network = network_config.init::<B>(&device);
        let agent = PPOAgent::new(network, config.ppo_config.clone(), device.clone());

        let env = VecEnvironment::new(
            config.ppo_config.num_envs,
            config.game_config.clone(),
            config.levels,
            device.clone(),
        );

        let eval_env = GridEnvironment::new(
            config.game_config.clone(),
            config.levels.held_out(config.eval_levels),
            device,
        );

        Ok(Self {
            agent,
            env,
            eval_env,
            stats: TrainingStats::new(100),
            history: RewardHistory::new(),
            config,
            env_steps: 0,
            updates: 0,
        })
    }

    /// Run the training loop
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        let mut observations = self.env.reset_all();
        let mut next_eval = self.config.eval_interval;
        let mut next_checkpoint = self.config.checkpoint_interval;

        while self.env_steps < self.config.total_steps {
            observations = self.collect_rollout(observations);

            let last_values = self.agent.value_batch(observations.clone());
            let update = self.agent.update(&last_values);
            self.updates += 1;

            self.stats.record_update(
                update.policy_loss,
                update.value_loss,
                update.entropy,
                update.approx_kl,
                update.clip_fraction,
            );
            self.history
                .push_train(self.env_steps, update.rollout_reward);

            if self.updates % self.config.log_frequency == 0 {
                self.print_progress();
            }

            if self.env_steps >= next_eval {
                let (eval_reward, eval_success) = self.run_evaluation();
                self.history
                    .push_eval(self.env_steps, eval_reward, eval_success);
                println!(
                    "  Eval @ {} steps: reward {:.2}, solved {:.0}%",
                    self.env_steps,
                    eval_reward,
                    eval_success * 100.0
                );
                next_eval += self.config.eval_interval;
            }

            if self.env_steps >= next_checkpoint {
                self.save_checkpoint()?;
                next_checkpoint += self.config.checkpoint_interval;
            }
        }

        self.save_final()?;
        Ok(())
    }

    /// Collect one fixed-horizon rollout across all environments
    ///
    /// Returns the observations following the last stored transition, which
    /// are used to bootstrap the value of the truncated rollout.
    fn collect_rollout(
        &mut self,
        mut observations: Vec<Tensor<B::InnerBackend, 3>>,
    ) -> Vec<Tensor<B::InnerBackend, 3>> {
        self.agent.begin_rollout(NUM_OBS_CHANNELS);

        while !self.agent.should_update() {
            let batch = self.agent.act(observations);
            let step = self.env.step(&batch.actions);

            self.agent.store_row(
                batch.observations,
                &batch.actions,
                &batch.log_probs,
                &step.rewards,
                &batch.values,
                &step.dones,
            );

            for episode in &step.finished {
                self.stats
                    .record_episode(episode.reward, episode.length as usize, episode.reached_goal);
            }

            self.env_steps += self.env.num_envs();
            observations = step.observations;
        }

        observations
    }

    /// Run evaluation episodes on held-out levels
    ///
    /// Actions are sampled from the policy without augmentation, so the
    /// score reflects the stochastic policy on unseen level seeds. Returns
    /// (mean reward, success rate).
    fn run_evaluation(&mut self) -> (f32, f32) {
        let mut total_reward = 0.0;
        let mut successes = 0;

        for _ in 0..self.config.eval_episodes {
            let mut observation = self.eval_env.reset();
            let mut episode_reward = 0.0;

            loop {
                let action = self.agent.act_sampled(observation);
                let (next_observation, reward, done) = self.eval_env.step(action);
                episode_reward += reward;
                observation = next_observation;

                if done {
                    if self.eval_env.state().reached_goal {
                        successes += 1;
                    }
                    break;
                }
            }

            total_reward += episode_reward;
        }

        let n = self.config.eval_episodes as f32;
        (total_reward / n, successes as f32 / n)
    }

    /// Save a checkpoint with the current step count in the file name
    fn save_checkpoint(&self) -> Result<()> {
        let stem = self
            .config
            .save_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        let name = format!("{}_{}.mpk", stem, self.env_steps);
        let path = self.config.save_path.with_file_name(name);

        save_model(
            &self.agent,
            &self.config.game_config,
            self.config.levels,
            self.env_steps,
            &path,
        )
        .with_context(|| format!("Failed to save checkpoint to {:?}", path))?;
        self.save_history()?;

        println!("  Checkpoint saved to {:?}", path);
        Ok(())
    }

    /// Save the final model and reward history
    fn save_final(&self) -> Result<()> {
        save_model(
            &self.agent,
            &self.config.game_config,
            self.config.levels,
            self.env_steps,
            &self.config.save_path,
        )
        .with_context(|| format!("Failed to save model to {:?}", self.config.save_path))?;
        self.save_history()?;

        println!();
        println!("Training complete after {} env steps.", self.env_steps);
        println!("Model saved to {:?}", self.config.save_path);
        Ok(())
    }

    fn save_history(&self) -> Result<()> {
        let history_path = self.config.save_path.with_extension("history.json");
        self.history
            .save(&history_path)
            .context("Failed to save reward history")
    }

    fn print_header(&self) {
        println!("=== GridRun Training ===");
        println!(
            "Grid: {}x{} | Envs: {} | Horizon: {}",
            self.config.game_config.grid_width,
            self.config.game_config.grid_height,
            self.config.ppo_config.num_envs,
            self.config.ppo_config.num_steps,
        );
        println!(
            "Levels: {} | Encoder: {:?} | Augmentation: {:?}",
            self.config.levels,
            self.config.ppo_config.encoder,
            self.config.ppo_config.augmentation,
        );
        println!(
            "Total steps: {} | LR: {} | Gamma: {}",
            self.config.total_steps,
            self.config.ppo_config.learning_rate,
            self.config.ppo_config.gamma,
        );
        println!();
    }

    fn print_progress(&self) {
        println!(
            "Update {} | Steps {} | {}",
            self.updates,
            self.env_steps,
            self.stats.format_summary()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{EncoderKind, TrainingBackend, default_device};
    use tempfile::TempDir;

    fn tiny_config(dir: &TempDir) -> TrainConfig {
        TrainConfig {
            total_steps: 16,
            eval_interval: 8,
            eval_episodes: 1,
            checkpoint_interval: 1_000_000,
            log_frequency: 1,
            save_path: dir.path().join("model.mpk"),
            levels: LevelSet::new(0, 4),
            eval_levels: 2,
            game_config: GameConfig::small(),
            ppo_config: PPOConfig {
                num_steps: 4,
                num_envs: 2,
                batch_size: 8,
                n_epochs: 1,
                encoder: EncoderKind::Nature,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_train_config_default() {
        let config = TrainConfig::default();
        assert_eq!(config.total_steps, 25_000_000);
        assert_eq!(config.eval_levels, 50);
        assert!(config.ppo_config.validate().is_ok());
    }

    #[test]
    fn test_train_mode_creation() {
        let dir = TempDir::new().unwrap();
        let config = tiny_config(&dir);
        let mode = TrainMode::<TrainingBackend>::new(config, default_device());
        assert!(mode.is_ok());
    }

    #[test]
    fn test_train_mode_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let mut config = tiny_config(&dir);
        config.ppo_config.gamma = 2.0;
        let mode = TrainMode::<TrainingBackend>::new(config, default_device());
        assert!(mode.is_err());
    }

    #[test]
    fn test_short_training_run_saves_model() {
        let dir = TempDir::new().unwrap();
        let config = tiny_config(&dir);
        let save_path = config.save_path.clone();

        let mut mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        mode.run().unwrap();

        assert!(mode.env_steps >= 16);
        assert!(mode.updates >= 1);
        assert!(save_path.exists());
        assert!(save_path.with_extension("meta.json").exists());
        assert!(save_path.with_extension("history.json").exists());
    }

    #[test]
    fn test_evaluation_runs() {
        let dir = TempDir::new().unwrap();
        let config = tiny_config(&dir);
        let mut mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();

        let (reward, success_rate) = mode.run_evaluation();
        assert!(reward.is_finite());
        assert!((0.0..=1.0).contains(&success_rate));
    }
}

//! Batched environment stepping with auto-reset
//!
//! PPO collects rollouts from many environments at once. `VecEnvironment`
//! owns a set of [`GridEnvironment`]s and steps them in lockstep: one call to
//! [`step`](VecEnvironment::step) advances every environment by one action.
//! When an episode ends, the environment is reset immediately and the fresh
//! observation takes the place of the terminal one, so the caller always holds
//! a live observation for every slot. Completed episodes are reported through
//! [`EpisodeRecord`]s.

use super::environment::GridEnvironment;
use crate::game::{GameConfig, LevelSet};
use burn::tensor::{Tensor, backend::Backend};

/// Summary of one finished episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeRecord {
    /// Total undiscounted reward over the episode
    pub reward: f32,
    /// Number of steps the episode lasted
    pub length: u32,
    /// Whether the agent reached the goal (as opposed to dying or timing out)
    pub reached_goal: bool,
}

/// Result of stepping all environments once
pub struct VecStep<B: Backend> {
    /// Next observation per environment (post-reset for finished episodes)
    pub observations: Vec<Tensor<B, 3>>,
    /// Reward per environment for this transition
    pub rewards: Vec<f32>,
    /// Whether each environment's episode ended on this transition
    pub dones: Vec<bool>,
    /// Episodes that finished on this step
    pub finished: Vec<EpisodeRecord>,
}

/// A fixed-size batch of environments stepped in lockstep
pub struct VecEnvironment<B: Backend> {
    envs: Vec<GridEnvironment<B>>,
    episode_rewards: Vec<f32>,
    episode_lengths: Vec<u32>,
}

impl<B: Backend> VecEnvironment<B> {
    /// Create `num_envs` environments all drawing levels from `levels`
    pub fn new(num_envs: usize, config: GameConfig, levels: LevelSet, device: B::Device) -> Self {
        let envs = (0..num_envs)
            .map(|_| GridEnvironment::new(config.clone(), levels, device.clone()))
            .collect();
        Self {
            envs,
            episode_rewards: vec![0.0; num_envs],
            episode_lengths: vec![0; num_envs],
        }
    }

    /// Number of environments in the batch
    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    /// Reset every environment and return the initial observations
    pub fn reset_all(&mut self) -> Vec<Tensor<B, 3>> {
        self.episode_rewards.iter_mut().for_each(|r| *r = 0.0);
        self.episode_lengths.iter_mut().for_each(|l| *l = 0);
        self.envs.iter_mut().map(|env| env.reset()).collect()
    }

    /// Step every environment with its action, auto-resetting finished ones
    ///
    /// # Panics
    ///
    /// Panics if `actions.len() != num_envs()`.
    pub fn step(&mut self, actions: &[usize]) -> VecStep<B> {
        assert_eq!(actions.len(), self.envs.len());

        let mut observations = Vec::with_capacity(self.envs.len());
        let mut rewards = Vec::with_capacity(self.envs.len());
        let mut dones = Vec::with_capacity(self.envs.len());
        let mut finished = Vec::new();

        for (e, env) in self.envs.iter_mut().enumerate() {
            let (obs, reward, done) = env.step(actions[e]);

            self.episode_rewards[e] += reward;
            self.episode_lengths[e] += 1;

            if done {
                finished.push(EpisodeRecord {
                    reward: self.episode_rewards[e],
                    length: self.episode_lengths[e],
                    reached_goal: env.state().reached_goal,
                });
                self.episode_rewards[e] = 0.0;
                self.episode_lengths[e] = 0;

                // Replace the terminal observation with a fresh episode's
                observations.push(env.reset());
            } else {
                observations.push(obs);
            }

            rewards.push(reward);
            dones.push(done);
        }

        VecStep {
            observations,
            rewards,
            dones,
            finished,
        }
    }

    /// Access the underlying environments (for rendering/debugging)
    pub fn envs(&self) -> &[GridEnvironment<B>] {
        &self.envs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::backend::ndarray::NdArrayDevice;

    type TestBackend = NdArray<f32>;

    fn make_vec_env(num_envs: usize) -> VecEnvironment<TestBackend> {
        let device = NdArrayDevice::default();
        VecEnvironment::new(num_envs, GameConfig::default(), LevelSet::default(), device)
    }

    #[test]
    fn test_reset_all_returns_one_observation_per_env() {
        let mut vec_env = make_vec_env(4);

        let observations = vec_env.reset_all();

        assert_eq!(observations.len(), 4);
        for obs in &observations {
            assert_eq!(obs.shape().dims, [5, 16, 16]);
        }
    }

    #[test]
    fn test_step_widths() {
        let mut vec_env = make_vec_env(3);
        vec_env.reset_all();

        let result = vec_env.step(&[4, 4, 4]);

        assert_eq!(result.observations.len(), 3);
        assert_eq!(result.rewards.len(), 3);
        assert_eq!(result.dones.len(), 3);
    }

    #[test]
    #[should_panic]
    fn test_step_wrong_action_count_panics() {
        let mut vec_env = make_vec_env(3);
        vec_env.reset_all();
        vec_env.step(&[4, 4]);
    }

    #[test]
    fn test_auto_reset_produces_live_observations() {
        let mut vec_env = make_vec_env(2);
        vec_env.reset_all();

        // Stay in place until both environments time out at least once
        let mut saw_done = false;
        for _ in 0..600 {
            let result = vec_env.step(&[4, 4]);
            if result.dones.iter().any(|&d| d) {
                saw_done = true;
            }
            // After auto-reset, every env must be mid-episode
            for env in vec_env.envs() {
                assert!(!env.state().terminated);
            }
        }
        assert!(saw_done, "Timeout episodes should have finished");
    }

    #[test]
    fn test_episode_records_on_timeout() {
        let mut vec_env = make_vec_env(1);
        vec_env.reset_all();

        let mut records = Vec::new();
        for _ in 0..600 {
            let result = vec_env.step(&[4]);
            records.extend(result.finished);
        }

        assert!(!records.is_empty());
        let record = records[0];

        // Staying in place: pure step penalties, no goal
        assert!(!record.reached_goal);
        assert!(record.reward < 0.0);
        assert!(record.length > 0);
    }

    #[test]
    fn test_episode_counters_reset_between_episodes() {
        let mut vec_env = make_vec_env(1);
        vec_env.reset_all();

        let mut records = Vec::new();
        for _ in 0..1200 {
            records.extend(vec_env.step(&[4]).finished);
        }

        // Timeout episodes are all the same length; accumulators must not
        // carry over from one episode to the next.
        assert!(records.len() >= 2);
        assert_eq!(records[0].length, records[1].length);
        assert!((records[0].reward - records[1].reward).abs() < 1e-4);
    }
}

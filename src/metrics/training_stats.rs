//! Training statistics tracking for PPO
//!
//! This module provides utilities for tracking and monitoring training
//! progress, including episode rewards, lengths, success rates, and loss
//! values.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// Tracks episode-level metrics (rewards, lengths, goal completion) and
/// training-level metrics (policy loss, value loss, entropy, approximate KL,
/// clip fraction) using rolling windows for smoothed statistics.
///
/// # Example
///
/// ```rust
/// use gridrun::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// // Record an episode
/// stats.record_episode(15.5, 150, true);
///
/// // Record a training update
/// stats.record_update(0.02, 0.05, 0.8, 0.01, 0.15);
///
/// // Get statistics
/// println!("Mean reward: {}", stats.mean_episode_reward());
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Whether each episode reached the goal (rolling window)
    episode_successes: VecDeque<bool>,

    /// Policy losses (rolling window)
    policy_losses: VecDeque<f32>,

    /// Value losses (rolling window)
    value_losses: VecDeque<f32>,

    /// Entropy values (rolling window)
    entropies: VecDeque<f32>,

    /// Approximate KL divergences (rolling window)
    approx_kls: VecDeque<f32>,

    /// Clip fractions (rolling window)
    clip_fractions: VecDeque<f32>,

    /// Total number of episodes completed
    total_episodes: usize,

    /// Total number of environment steps taken
    total_steps: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a new training statistics tracker
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of recent values to keep for rolling averages
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_successes: VecDeque::with_capacity(window_size),
            policy_losses: VecDeque::with_capacity(window_size),
            value_losses: VecDeque::with_capacity(window_size),
            entropies: VecDeque::with_capacity(window_size),
            approx_kls: VecDeque::with_capacity(window_size),
            clip_fractions: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    ///
    /// # Arguments
    ///
    /// * `reward` - Total reward accumulated during the episode
    /// * `length` - Number of steps taken in the episode
    /// * `reached_goal` - Whether the episode ended at the goal
    pub fn record_episode(&mut self, reward: f32, length: usize, reached_goal: bool) {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.episode_successes, reached_goal, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;
    }

    /// Record a training update
    pub fn record_update(
        &mut self,
        policy_loss: f32,
        value_loss: f32,
        entropy: f32,
        approx_kl: f32,
        clip_fraction: f32,
    ) {
        Self::push_deque(&mut self.policy_losses, policy_loss, self.window_size);
        Self::push_deque(&mut self.value_losses, value_loss, self.window_size);
        Self::push_deque(&mut self.entropies, entropy, self.window_size);
        Self::push_deque(&mut self.approx_kls, approx_kl, self.window_size);
        Self::push_deque(&mut self.clip_fractions, clip_fraction, self.window_size);
    }

    /// Mean episode reward over the rolling window (0.0 when empty)
    pub fn mean_episode_reward(&self) -> f32 {
        Self::mean(&self.episode_rewards)
    }

    /// Mean episode length over the rolling window
    pub fn mean_episode_length(&self) -> f32 {
        let sum: usize = self.episode_lengths.iter().sum();
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            sum as f32 / self.episode_lengths.len() as f32
        }
    }

    /// Fraction of recent episodes that reached the goal
    pub fn success_rate(&self) -> f32 {
        if self.episode_successes.is_empty() {
            0.0
        } else {
            let successes = self.episode_successes.iter().filter(|&&s| s).count();
            successes as f32 / self.episode_successes.len() as f32
        }
    }

    /// Mean policy loss over the rolling window
    pub fn mean_policy_loss(&self) -> f32 {
        Self::mean(&self.policy_losses)
    }

    /// Mean value loss over the rolling window
    pub fn mean_value_loss(&self) -> f32 {
        Self::mean(&self.value_losses)
    }

    /// Mean entropy over the rolling window
    pub fn mean_entropy(&self) -> f32 {
        Self::mean(&self.entropies)
    }

    /// Mean approximate KL divergence over the rolling window
    pub fn mean_approx_kl(&self) -> f32 {
        Self::mean(&self.approx_kls)
    }

    /// Mean clip fraction over the rolling window
    pub fn mean_clip_fraction(&self) -> f32 {
        Self::mean(&self.clip_fractions)
    }

    /// Get the total number of episodes completed
    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Get the total number of environment steps taken
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Get the window size for rolling averages
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Format a summary of the current statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Reward: {:.2} | Solved: {:.0}% | Len: {:.1} | P_Loss: {:.4} | V_Loss: {:.4} | Entropy: {:.4} | KL: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_reward(),
            self.success_rate() * 100.0,
            self.mean_episode_length(),
            self.mean_policy_loss(),
            self.mean_value_loss(),
            self.mean_entropy(),
            self.mean_approx_kl(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let stats = TrainingStats::new(100);
        assert_eq!(stats.window_size(), 100);
        assert_eq!(stats.total_episodes(), 0);
        assert_eq!(stats.total_steps(), 0);
    }

    #[test]
    fn test_record_episode() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(10.0, 50, true);

        assert_eq!(stats.total_episodes(), 1);
        assert_eq!(stats.total_steps(), 50);
        assert!((stats.mean_episode_reward() - 10.0).abs() < 1e-5);
        assert!((stats.mean_episode_length() - 50.0).abs() < 1e-5);
        assert!((stats.success_rate() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_success_rate() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(10.0, 50, true);
        stats.record_episode(-2.0, 256, false);
        stats.record_episode(8.0, 70, true);
        stats.record_episode(-10.0, 12, false);

        assert!((stats.success_rate() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_record_update() {
        let mut stats = TrainingStats::new(100);
        stats.record_update(0.02, 0.05, 0.8, 0.01, 0.15);

        assert!((stats.mean_policy_loss() - 0.02).abs() < 1e-5);
        assert!((stats.mean_value_loss() - 0.05).abs() < 1e-5);
        assert!((stats.mean_entropy() - 0.8).abs() < 1e-5);
        assert!((stats.mean_approx_kl() - 0.01).abs() < 1e-5);
        assert!((stats.mean_clip_fraction() - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_average() {
        let mut stats = TrainingStats::new(3);

        stats.record_episode(1.0, 10, false);
        stats.record_episode(2.0, 20, false);
        stats.record_episode(3.0, 30, true);

        assert_eq!(stats.total_episodes(), 3);
        assert!((stats.mean_episode_reward() - 2.0).abs() < 1e-5);

        // A 4th episode evicts the first
        stats.record_episode(4.0, 40, true);

        assert_eq!(stats.total_episodes(), 4);
        // Mean is now (2.0 + 3.0 + 4.0) / 3 = 3.0
        assert!((stats.mean_episode_reward() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_window_update() {
        let mut stats = TrainingStats::new(2);

        stats.record_update(0.1, 0.2, 0.9, 0.01, 0.1);
        stats.record_update(0.2, 0.3, 0.8, 0.02, 0.2);

        assert!((stats.mean_policy_loss() - 0.15).abs() < 1e-5);

        // A 3rd update evicts the first
        stats.record_update(0.3, 0.4, 0.7, 0.03, 0.3);

        // Mean is now (0.2 + 0.3) / 2 = 0.25
        assert!((stats.mean_policy_loss() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_total_steps_accumulate() {
        let mut stats = TrainingStats::new(10);

        stats.record_episode(1.0, 10, false);
        stats.record_episode(2.0, 20, false);
        stats.record_episode(3.0, 30, false);

        assert_eq!(stats.total_steps(), 60);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(15.5, 150, true);
        stats.record_update(0.02, 0.05, 0.8, 0.01, 0.15);

        let summary = stats.format_summary();
        assert!(summary.contains("Episodes: 1"));
        assert!(summary.contains("Steps: 150"));
        assert!(summary.contains("Reward: 15.50"));
        assert!(summary.contains("Solved: 100%"));
        assert!(summary.contains("Len: 150.0"));
        assert!(summary.contains("P_Loss: 0.0200"));
        assert!(summary.contains("V_Loss: 0.0500"));
        assert!(summary.contains("Entropy: 0.8000"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrainingStats::new(100);

        assert_eq!(stats.mean_episode_reward(), 0.0);
        assert_eq!(stats.mean_episode_length(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.mean_policy_loss(), 0.0);
        assert_eq!(stats.mean_value_loss(), 0.0);
        assert_eq!(stats.mean_entropy(), 0.0);
    }
}

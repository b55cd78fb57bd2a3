//! PPO algorithm hyperparameter configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which convolutional encoder the actor-critic network uses
///
/// `Nature` is the small three-conv-layer encoder, `Impala` is the deeper
/// residual encoder. The IMPALA encoder generalizes better across level seeds
/// at the cost of slower forward passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum EncoderKind {
    /// Three plain convolution layers followed by a dense layer
    Nature,
    /// Three residual blocks (conv + max-pool + two residual units each)
    Impala,
}

/// Observation augmentation applied during training rollouts and updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Augmentation {
    /// No augmentation
    None,
    /// Random convolution: pass observations through a freshly sampled,
    /// untrained 3x3 convolution each rollout
    RandConv,
}

/// Configuration for the PPO (Proximal Policy Optimization) algorithm
///
/// This struct contains all hyperparameters used by the PPO training
/// algorithm. Default values are tuned for generalization across procedurally
/// generated levels: a long horizon (gamma close to 1), large batches, and a
/// modest number of optimization epochs per update.
///
/// # Example
///
/// ```rust
/// use gridrun::rl::PPOConfig;
///
/// // Use default hyperparameters
/// let config = PPOConfig::default();
///
/// // Or customize specific parameters
/// let config = PPOConfig {
///     learning_rate: 1e-3,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PPOConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 5e-4
    pub learning_rate: f64,

    /// Epsilon term in the Adam denominator
    ///
    /// Default: 1e-5
    pub adam_epsilon: f32,

    /// Discount factor for future rewards (gamma)
    ///
    /// Determines how much future rewards are valued relative to immediate
    /// rewards. Values closer to 1.0 make the agent more far-sighted.
    ///
    /// Default: 0.999
    pub gamma: f32,

    /// GAE (Generalized Advantage Estimation) lambda parameter
    ///
    /// Controls the bias-variance tradeoff in advantage estimation.
    /// Higher values (closer to 1.0) use more Monte Carlo estimates (higher
    /// variance, lower bias). Lower values use more TD estimates (lower
    /// variance, higher bias).
    ///
    /// Default: 0.95
    pub gae_lambda: f32,

    /// PPO clipping parameter (epsilon)
    ///
    /// Limits how much the policy can change in a single update.
    /// Prevents destructively large policy updates.
    ///
    /// Default: 0.2
    pub clip_epsilon: f32,

    /// Clipping range for the value function loss
    ///
    /// The value loss takes the maximum of the unclipped squared error and the
    /// squared error of the prediction clipped around the rollout-time value.
    ///
    /// Default: 0.2
    pub value_clip: f32,

    /// Coefficient for the entropy bonus in the loss function
    ///
    /// Encourages exploration by adding entropy of the policy to the objective.
    /// Higher values lead to more exploration.
    ///
    /// Default: 0.01
    pub entropy_coef: f32,

    /// Coefficient for the value function loss
    ///
    /// Default: 0.5
    pub value_coef: f32,

    /// Maximum gradient norm for gradient clipping
    ///
    /// Prevents exploding gradients by clipping the global gradient norm.
    ///
    /// Default: 0.5
    pub max_grad_norm: f32,

    /// Number of optimization epochs per PPO update
    ///
    /// How many times to iterate over the rollout buffer during each update.
    ///
    /// Default: 3
    pub n_epochs: usize,

    /// Minibatch size for training
    ///
    /// Number of samples to use in each gradient update step.
    ///
    /// Default: 512
    pub batch_size: usize,

    /// Number of steps to collect per environment before each PPO update
    ///
    /// Default: 256
    pub num_steps: usize,

    /// Number of environments stepped in parallel
    ///
    /// Default: 32
    pub num_envs: usize,

    /// Which encoder architecture the network uses
    ///
    /// Default: Impala
    pub encoder: EncoderKind,

    /// Observation augmentation applied to training data
    ///
    /// Default: RandConv
    pub augmentation: Augmentation,
}

impl PPOConfig {
    /// Create a new configuration with default hyperparameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of transitions gathered per rollout (`num_steps * num_envs`)
    pub fn rollout_size(&self) -> usize {
        self.num_steps * self.num_envs
    }

    /// Validate configuration parameters
    ///
    /// Checks that all hyperparameters are in valid ranges.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error
    /// message otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gridrun::rl::PPOConfig;
    ///
    /// let mut config = PPOConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.learning_rate = -0.1;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if self.adam_epsilon <= 0.0 {
            return Err(format!(
                "adam_epsilon must be positive, got {}",
                self.adam_epsilon
            ));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        if !(0.0..=1.0).contains(&self.gae_lambda) {
            return Err(format!(
                "gae_lambda must be in [0, 1], got {}",
                self.gae_lambda
            ));
        }

        if self.clip_epsilon <= 0.0 || self.clip_epsilon > 1.0 {
            return Err(format!(
                "clip_epsilon must be in (0, 1], got {}",
                self.clip_epsilon
            ));
        }

        if self.value_clip <= 0.0 {
            return Err(format!(
                "value_clip must be positive, got {}",
                self.value_clip
            ));
        }

        if self.entropy_coef < 0.0 {
            return Err(format!(
                "entropy_coef must be non-negative, got {}",
                self.entropy_coef
            ));
        }

        if self.value_coef < 0.0 {
            return Err(format!(
                "value_coef must be non-negative, got {}",
                self.value_coef
            ));
        }

        if self.max_grad_norm <= 0.0 {
            return Err(format!(
                "max_grad_norm must be positive, got {}",
                self.max_grad_norm
            ));
        }

        if self.n_epochs == 0 {
            return Err("n_epochs must be at least 1".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }

        if self.num_steps == 0 {
            return Err("num_steps must be at least 1".to_string());
        }

        if self.num_envs == 0 {
            return Err("num_envs must be at least 1".to_string());
        }

        if self.batch_size > self.rollout_size() {
            return Err(format!(
                "batch_size ({}) cannot exceed rollout size ({})",
                self.batch_size,
                self.rollout_size()
            ));
        }

        Ok(())
    }
}

impl Default for PPOConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-4,
            adam_epsilon: 1e-5,
            gamma: 0.999,
            gae_lambda: 0.95,
            clip_epsilon: 0.2,
            value_clip: 0.2,
            entropy_coef: 0.01,
            value_coef: 0.5,
            max_grad_norm: 0.5,
            n_epochs: 3,
            batch_size: 512,
            num_steps: 256,
            num_envs: 32,
            encoder: EncoderKind::Impala,
            augmentation: Augmentation::RandConv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PPOConfig::default();
        assert_eq!(config.learning_rate, 5e-4);
        assert_eq!(config.adam_epsilon, 1e-5);
        assert_eq!(config.gamma, 0.999);
        assert_eq!(config.gae_lambda, 0.95);
        assert_eq!(config.clip_epsilon, 0.2);
        assert_eq!(config.value_clip, 0.2);
        assert_eq!(config.entropy_coef, 0.01);
        assert_eq!(config.value_coef, 0.5);
        assert_eq!(config.max_grad_norm, 0.5);
        assert_eq!(config.n_epochs, 3);
        assert_eq!(config.batch_size, 512);
        assert_eq!(config.num_steps, 256);
        assert_eq!(config.num_envs, 32);
        assert_eq!(config.encoder, EncoderKind::Impala);
        assert_eq!(config.augmentation, Augmentation::RandConv);
    }

    #[test]
    fn test_new_creates_default() {
        let config = PPOConfig::new();
        let default = PPOConfig::default();
        assert_eq!(config.learning_rate, default.learning_rate);
        assert_eq!(config.gamma, default.gamma);
    }

    #[test]
    fn test_rollout_size() {
        let config = PPOConfig::default();
        assert_eq!(config.rollout_size(), 256 * 32);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = PPOConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_learning_rate() {
        let mut config = PPOConfig::default();
        config.learning_rate = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gamma_out_of_range() {
        let mut config = PPOConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        config.gamma = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gae_lambda_out_of_range() {
        let mut config = PPOConfig::default();
        config.gae_lambda = 1.5;
        assert!(config.validate().is_err());

        config.gae_lambda = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_clip_epsilon_invalid() {
        let mut config = PPOConfig::default();
        config.clip_epsilon = 0.0;
        assert!(config.validate().is_err());

        config.clip_epsilon = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_negative_coefficients() {
        let mut config = PPOConfig::default();
        config.entropy_coef = -0.1;
        assert!(config.validate().is_err());

        config.entropy_coef = 0.01;
        config.value_coef = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_epochs() {
        let mut config = PPOConfig::default();
        config.n_epochs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_batch_size() {
        let mut config = PPOConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_num_steps() {
        let mut config = PPOConfig::default();
        config.num_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_num_envs() {
        let mut config = PPOConfig::default();
        config.num_envs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_batch_size_exceeds_rollout() {
        let mut config = PPOConfig::default();
        config.num_steps = 4;
        config.num_envs = 4;
        config.batch_size = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_batch_size_equals_rollout() {
        let mut config = PPOConfig::default();
        config.num_steps = 16;
        config.num_envs = 2;
        config.batch_size = 32;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = PPOConfig {
            learning_rate: 1e-3,
            gamma: 0.99,
            n_epochs: 10,
            encoder: EncoderKind::Nature,
            augmentation: Augmentation::None,
            ..Default::default()
        };
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.n_epochs, 10);
        assert_eq!(config.clip_epsilon, 0.2); // From default
        assert!(config.validate().is_ok());
    }
}

//! PPO (Proximal Policy Optimization) agent implementation
//!
//! This module implements the PPO algorithm for training the grid agent.
//! It includes batched action selection, clipped loss computation, and
//! parameter updates.

use super::augment::RandConv;
use super::buffer::RolloutBuffer;
use super::config::{Augmentation, PPOConfig};
use super::network::ActorCriticNetwork;
use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{
        ElementConversion, Int, Tensor,
        activation::{log_softmax, softmax},
        backend::{AutodiffBackend, Backend},
    },
};
use rand::Rng;

/// Result of one batched action selection
pub struct ActionBatch<B: Backend> {
    /// Sampled action index per environment
    pub actions: Vec<usize>,
    /// Log probability of each sampled action
    pub log_probs: Vec<f32>,
    /// Value estimate per environment
    pub values: Vec<f32>,
    /// The observations as the policy saw them (augmented when enabled)
    ///
    /// These are what must be stored in the rollout buffer so the update step
    /// recomputes log probabilities on the same inputs.
    pub observations: Vec<Tensor<B, 3>>,
}

/// Averaged diagnostics from one PPO update
#[derive(Debug, Clone, Copy)]
pub struct UpdateStats {
    pub policy_loss: f32,
    pub value_loss: f32,
    pub entropy: f32,
    pub total_loss: f32,
    /// Approximate KL divergence between old and new policy
    pub approx_kl: f32,
    /// Fraction of samples where the probability ratio was clipped
    pub clip_fraction: f32,
    /// Mean per-environment reward sum over the rollout that was consumed
    pub rollout_reward: f32,
}

/// PPO agent for reinforcement learning
///
/// Combines an actor-critic network with the PPO training algorithm. Manages
/// batched experience collection, advantage estimation, observation
/// augmentation, and policy optimization.
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation
pub struct PPOAgent<B: AutodiffBackend> {
    /// Actor-Critic neural network
    network: ActorCriticNetwork<B>,

    /// Adam optimizer for network parameters
    optim: OptimizerAdaptor<Adam, ActorCriticNetwork<B>, B>,

    /// PPO hyperparameters
    config: PPOConfig,

    /// Rollout buffer for collected transitions
    buffer: RolloutBuffer<B::InnerBackend>,

    /// Random convolution filter for the current rollout, if enabled
    augment: Option<RandConv<B::InnerBackend>>,

    /// Number of PPO updates performed
    training_step: usize,

    /// Device for tensor operations
    device: B::Device,
}

impl<B: AutodiffBackend> PPOAgent<B> {
    /// Create a new PPO agent
    ///
    /// # Panics
    ///
    /// Panics if `config.validate()` fails.
    pub fn new(
        network: ActorCriticNetwork<B>,
        config: PPOConfig,
        device: B::Device,
    ) -> Self {
        config.validate().expect("Invalid PPO configuration");

        let optim = AdamConfig::new()
            .with_epsilon(config.adam_epsilon)
            .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
            .init();

        let buffer = RolloutBuffer::new(config.num_steps, config.num_envs, device.clone());

        Self {
            network,
            optim,
            config,
            buffer,
            augment: None,
            training_step: 0,
            device,
        }
    }

    /// Start a fresh rollout, resampling the augmentation filter if enabled
    ///
    /// Called once before each collection phase so every rollout sees a
    /// different random recoloring of the observations.
    pub fn begin_rollout(&mut self, num_channels: usize) {
        self.augment = match self.config.augmentation {
            Augmentation::None => None,
            Augmentation::RandConv => Some(RandConv::sample(num_channels, &self.device)),
        };
    }

    /// Apply the current augmentation filter, if any
    fn augmented(&self, observations: Tensor<B::InnerBackend, 4>) -> Tensor<B::InnerBackend, 4> {
        match &self.augment {
            Some(filter) => filter.apply(observations),
            None => observations,
        }
    }

    /// Select actions for a batch of observations during rollout
    ///
    /// Samples one action per observation from the policy distribution in
    /// no-grad mode. The returned [`ActionBatch`] carries the (possibly
    /// augmented) observations that the policy actually evaluated.
    pub fn act(&self, observations: Vec<Tensor<B::InnerBackend, 3>>) -> ActionBatch<B::InnerBackend> {
        let n = observations.len();
        let batch: Tensor<B::InnerBackend, 4> = Tensor::stack(observations, 0);
        let batch = self.augmented(batch);

        let network = self.network.clone().valid();
        let (action_logits, values) = network.forward(batch.clone());

        // Sample from the categorical distribution per row
        let probs = softmax(action_logits.clone(), 1);
        let probs_data = probs.to_data();
        let probs_flat: Vec<f32> = probs_data.to_vec().expect("Failed to read probabilities");
        let num_actions = probs_flat.len() / n;

        let mut rng = rand::thread_rng();
        let actions: Vec<usize> = (0..n)
            .map(|i| sample_categorical(&probs_flat[i * num_actions..(i + 1) * num_actions], &mut rng))
            .collect();

        // Log probabilities of the sampled actions
        let log_probs_all = log_softmax(action_logits, 1);
        let actions_i32: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let action_tensor =
            Tensor::<B::InnerBackend, 1, Int>::from_ints(actions_i32.as_slice(), &self.device);
        let log_probs_tensor = log_probs_all
            .gather(1, action_tensor.unsqueeze_dim(1))
            .squeeze::<1>(1);
        let log_probs: Vec<f32> = log_probs_tensor
            .into_data()
            .to_vec()
            .expect("Failed to read log probabilities");

        let values: Vec<f32> = values
            .squeeze::<1>(1)
            .into_data()
            .to_vec()
            .expect("Failed to read values");

        // Split the augmented batch back into per-env observations
        let [_, channels, height, width] = batch.dims();
        let observations: Vec<Tensor<B::InnerBackend, 3>> = (0..n)
            .map(|i| {
                batch
                    .clone()
                    .slice([i..i + 1, 0..channels, 0..height, 0..width])
                    .squeeze(0)
            })
            .collect();

        ActionBatch {
            actions,
            log_probs,
            values,
            observations,
        }
    }

    /// Value estimates for a batch of observations, for bootstrapping
    ///
    /// Uses the same augmentation filter as the rollout so the bootstrap
    /// values match the stored ones in distribution.
    pub fn value_batch(&self, observations: Vec<Tensor<B::InnerBackend, 3>>) -> Vec<f32> {
        let batch: Tensor<B::InnerBackend, 4> = Tensor::stack(observations, 0);
        let batch = self.augmented(batch);

        let network = self.network.clone().valid();
        let (_, values) = network.forward(batch);
        values
            .squeeze::<1>(1)
            .into_data()
            .to_vec()
            .expect("Failed to read values")
    }

    /// Sample an action for a single observation without augmentation
    ///
    /// Used for evaluation runs during training, where the policy's own
    /// stochasticity is wanted but the rollout's augmentation filter is not.
    pub fn act_sampled(&self, observation: Tensor<B::InnerBackend, 3>) -> usize {
        let obs_batch = observation.unsqueeze_dim(0);

        let network = self.network.clone().valid();
        let (action_logits, _) = network.forward(obs_batch);

        let probs = softmax(action_logits, 1);
        let probs_flat: Vec<f32> = probs
            .into_data()
            .to_vec()
            .expect("Failed to read probabilities");

        let mut rng = rand::thread_rng();
        sample_categorical(&probs_flat, &mut rng)
    }

    /// Select the highest-probability action for a single observation
    ///
    /// Used for evaluation and visualization. No augmentation is applied.
    pub fn act_greedy(&self, observation: Tensor<B::InnerBackend, 3>) -> usize {
        let obs_batch = observation.unsqueeze_dim(0);

        let network = self.network.clone().valid();
        let (action_logits, _) = network.forward(obs_batch);

        action_logits
            .argmax(1)
            .into_scalar()
            .elem::<i64>() as usize
    }

    /// Store one time step of transitions for all environments
    pub fn store_row(
        &mut self,
        observations: Vec<Tensor<B::InnerBackend, 3>>,
        actions: &[usize],
        log_probs: &[f32],
        rewards: &[f32],
        values: &[f32],
        dones: &[bool],
    ) {
        self.buffer
            .push_row(observations, actions, log_probs, rewards, values, dones);
    }

    /// Check if a full rollout has been collected
    pub fn should_update(&self) -> bool {
        self.buffer.is_full()
    }

    /// Perform a PPO update over the collected rollout
    ///
    /// Computes advantages using GAE with `last_values` bootstrapping each
    /// environment, then performs `n_epochs` of shuffled minibatch updates
    /// with the clipped surrogate objective and the clipped value loss.
    pub fn update(&mut self, last_values: &[f32]) -> UpdateStats {
        let rollout_reward = self.buffer.mean_reward();
        self.buffer
            .compute_advantages(self.config.gamma, self.config.gae_lambda, last_values);

        let mut total_policy_loss = 0.0;
        let mut total_value_loss = 0.0;
        let mut total_entropy = 0.0;
        let mut total_kl = 0.0;
        let mut total_clip_fraction = 0.0;
        let mut n_updates = 0;

        for _epoch in 0..self.config.n_epochs {
            let batch_indices = self.buffer.sample_indices(self.config.batch_size);

            for indices in batch_indices {
                let (
                    obs_data,
                    actions_data,
                    old_log_probs_data,
                    old_values_data,
                    advantages_data,
                    returns_data,
                ) = self.buffer.get_batch(&indices);

                // Construct tensors directly on the autodiff backend
                let obs: Tensor<B, 4> = Tensor::from_data(obs_data, &self.device);
                let actions: Tensor<B, 1, Int> = Tensor::from_data(actions_data, &self.device);
                let old_log_probs: Tensor<B, 1> =
                    Tensor::from_data(old_log_probs_data, &self.device);
                let old_values: Tensor<B, 1> = Tensor::from_data(old_values_data, &self.device);
                let advantages: Tensor<B, 1> = Tensor::from_data(advantages_data, &self.device);
                let returns: Tensor<B, 1> = Tensor::from_data(returns_data, &self.device);

                let (action_logits, values) = self.network.forward(obs);

                let (policy_loss, entropy, approx_kl, clip_fraction) =
                    self.compute_policy_loss(&action_logits, &actions, &old_log_probs, &advantages);

                let value_loss = self.compute_value_loss(&values, &old_values, &returns);

                // Total loss: L_policy + c_value * L_value - c_entropy * H
                let total_loss = policy_loss.clone()
                    + value_loss.clone() * self.config.value_coef
                    - entropy.clone() * self.config.entropy_coef;

                let grads = total_loss.backward();
                let grads = GradientsParams::from_grads(grads, &self.network);
                self.network =
                    self.optim
                        .step(self.config.learning_rate, self.network.clone(), grads);

                total_policy_loss += policy_loss.into_scalar().elem::<f32>();
                total_value_loss += value_loss.into_scalar().elem::<f32>();
                total_entropy += entropy.into_scalar().elem::<f32>();
                total_kl += approx_kl;
                total_clip_fraction += clip_fraction;
                n_updates += 1;
            }
        }

        self.buffer.clear();
        self.training_step += 1;

        let n = n_updates as f32;
        UpdateStats {
            policy_loss: total_policy_loss / n,
            value_loss: total_value_loss / n,
            entropy: total_entropy / n,
            total_loss: (total_policy_loss + total_value_loss) / n,
            approx_kl: total_kl / n,
            clip_fraction: total_clip_fraction / n,
            rollout_reward,
        }
    }

    /// Compute the clipped PPO policy loss
    ///
    /// Implements the clipped surrogate objective:
    /// `L = -E[min(r * A, clip(r, 1-ε, 1+ε) * A)]` where `r = π_new / π_old`.
    ///
    /// # Returns
    ///
    /// A tuple containing:
    /// - `policy_loss` - Clipped policy loss (scalar tensor)
    /// - `entropy` - Policy entropy (scalar tensor)
    /// - `approx_kl` - Mean `log π_old - log π_new` over the batch
    /// - `clip_fraction` - Fraction of samples with a clipped ratio
    fn compute_policy_loss(
        &self,
        action_logits: &Tensor<B, 2>,
        actions: &Tensor<B, 1, Int>,
        old_log_probs: &Tensor<B, 1>,
        advantages: &Tensor<B, 1>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>, f32, f32) {
        let log_probs = log_softmax(action_logits.clone(), 1);
        let new_log_probs = log_probs
            .clone()
            .gather(1, actions.clone().unsqueeze_dim(1))
            .squeeze(1);

        // Probability ratio: r = exp(log π_new - log π_old)
        let ratio = (new_log_probs.clone() - old_log_probs.clone()).exp();

        // Clipped surrogate objective
        let surr1 = ratio.clone() * advantages.clone();
        let surr2 = ratio.clone().clamp(
            1.0 - self.config.clip_epsilon,
            1.0 + self.config.clip_epsilon,
        ) * advantages.clone();

        // Policy loss: -E[min(surr1, surr2)]
        let policy_loss = surr1.min_pair(surr2).neg().mean();

        // Entropy: -E[Σ π(a|s) * log π(a|s)]
        let probs = softmax(action_logits.clone(), 1);
        let entropy = (probs * log_probs).sum_dim(1).neg().mean();

        // Diagnostics, computed outside the gradient path
        let approx_kl = (old_log_probs.clone() - new_log_probs)
            .mean()
            .into_scalar()
            .elem::<f32>();
        let clip_fraction = ratio
            .sub_scalar(1.0)
            .abs()
            .greater_elem(self.config.clip_epsilon)
            .float()
            .mean()
            .into_scalar()
            .elem::<f32>();

        (policy_loss, entropy, approx_kl, clip_fraction)
    }

    /// Compute the clipped value function loss
    ///
    /// The new value estimate is clipped to stay within `value_clip` of the
    /// rollout-time estimate, and the larger of the clipped and unclipped
    /// squared errors is taken:
    ///
    /// ```text
    /// V_clip = V_old + clamp(V - V_old, -ε_v, ε_v)
    /// L = 0.5 * E[max((V - R)², (V_clip - R)²)]
    /// ```
    fn compute_value_loss(
        &self,
        values: &Tensor<B, 2>,
        old_values: &Tensor<B, 1>,
        returns: &Tensor<B, 1>,
    ) -> Tensor<B, 1> {
        let values = values.clone().squeeze(1); // [batch]

        let clipped = old_values.clone()
            + (values.clone() - old_values.clone())
                .clamp(-self.config.value_clip, self.config.value_clip);

        let unclipped_error = values - returns.clone();
        let clipped_error = clipped - returns.clone();

        let unclipped_loss = unclipped_error.clone() * unclipped_error;
        let clipped_loss = clipped_error.clone() * clipped_error;

        unclipped_loss.max_pair(clipped_loss).mean() * 0.5
    }

    /// Get the number of PPO updates performed
    pub fn training_step(&self) -> usize {
        self.training_step
    }

    /// Get a reference to the neural network
    pub fn network(&self) -> &ActorCriticNetwork<B> {
        &self.network
    }

    /// Get a reference to the PPO configuration
    pub fn config(&self) -> &PPOConfig {
        &self.config
    }
}

/// Sample an index from one row of categorical probabilities
fn sample_categorical(probs: &[f32], rng: &mut impl Rng) -> usize {
    let random_val: f32 = rng.sample(rand::distributions::Standard);
    let mut cumsum = 0.0;

    for (idx, &prob) in probs.iter().enumerate() {
        cumsum += prob;
        if random_val < cumsum {
            return idx;
        }
    }

    // Fallback to last action (rounding error in cumsum)
    probs.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, LevelSet};
    use crate::rl::config::EncoderKind;
    use crate::rl::{ActorCriticConfig, VecEnvironment};
    use burn::backend::{
        Autodiff,
        ndarray::{NdArray, NdArrayDevice},
    };

    type TestBackend = Autodiff<NdArray<f32>>;
    type TestInferenceBackend = NdArray<f32>;

    const GRID: usize = 8;

    fn small_config() -> PPOConfig {
        PPOConfig {
            num_steps: 8,
            num_envs: 2,
            batch_size: 8,
            n_epochs: 2,
            encoder: EncoderKind::Nature,
            augmentation: Augmentation::None,
            ..Default::default()
        }
    }

    fn create_test_agent(config: PPOConfig) -> PPOAgent<TestBackend> {
        let device = NdArrayDevice::default();
        let network_config = ActorCriticConfig::new(GRID, GRID, config.encoder);
        let network = network_config.init::<TestBackend>(&device);
        PPOAgent::new(network, config, device)
    }

    fn zero_obs(n: usize) -> Vec<Tensor<TestInferenceBackend, 3>> {
        let device = NdArrayDevice::default();
        (0..n).map(|_| Tensor::zeros([5, GRID, GRID], &device)).collect()
    }

    #[test]
    fn test_agent_creation() {
        let agent = create_test_agent(small_config());
        assert_eq!(agent.training_step(), 0);
        assert!(!agent.should_update());
    }

    #[test]
    fn test_act_batched() {
        let agent = create_test_agent(small_config());

        let batch = agent.act(zero_obs(2));

        assert_eq!(batch.actions.len(), 2);
        assert_eq!(batch.log_probs.len(), 2);
        assert_eq!(batch.values.len(), 2);
        assert_eq!(batch.observations.len(), 2);

        for &action in &batch.actions {
            assert!(action < 5);
        }
        for &log_prob in &batch.log_probs {
            assert!(log_prob < 0.0);
        }
        for &value in &batch.values {
            assert!(value.is_finite());
        }
        for obs in &batch.observations {
            assert_eq!(obs.dims(), [5, GRID, GRID]);
        }
    }

    #[test]
    fn test_act_with_augmentation_changes_observations() {
        let mut config = small_config();
        config.augmentation = Augmentation::RandConv;
        let mut agent = create_test_agent(config);

        agent.begin_rollout(5);

        let device = NdArrayDevice::default();
        let obs: Tensor<TestInferenceBackend, 3> = Tensor::ones([5, GRID, GRID], &device);
        let batch = agent.act(vec![obs.clone()]);

        // Augmented observation should differ from the raw one
        let raw: Vec<f32> = obs.into_data().to_vec().unwrap();
        let seen: Vec<f32> = batch.observations[0].clone().into_data().to_vec().unwrap();
        let max_diff = raw
            .iter()
            .zip(&seen)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff > 1e-6);
    }

    #[test]
    fn test_act_greedy_is_deterministic() {
        let agent = create_test_agent(small_config());
        let device = NdArrayDevice::default();
        let obs: Tensor<TestInferenceBackend, 3> =
            Tensor::random([5, GRID, GRID], burn::tensor::Distribution::Uniform(0.0, 1.0), &device);

        let a = agent.act_greedy(obs.clone());
        let b = agent.act_greedy(obs);

        assert!(a < 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_buffer_fills_and_updates() {
        let mut agent = create_test_agent(small_config());

        for _ in 0..8 {
            agent.store_row(
                zero_obs(2),
                &[0, 1],
                &[-1.0, -1.0],
                &[1.0, 0.0],
                &[0.5, 0.5],
                &[false, false],
            );
        }

        assert!(agent.should_update());

        let stats = agent.update(&[0.5, 0.5]);

        assert!(stats.policy_loss.is_finite());
        assert!(stats.value_loss.is_finite());
        assert!(stats.entropy.is_finite());
        assert!(stats.total_loss.is_finite());
        assert!(stats.approx_kl.is_finite());
        assert!((0.0..=1.0).contains(&stats.clip_fraction));
        // Env 0 collected 8 * 1.0, env 1 collected nothing
        assert!((stats.rollout_reward - 4.0).abs() < 1e-6);

        // Buffer should be cleared and the update counter advanced
        assert!(!agent.should_update());
        assert_eq!(agent.training_step(), 1);
    }

    #[test]
    fn test_value_loss_zero_when_exact() {
        let agent = create_test_agent(small_config());
        let device = NdArrayDevice::default();

        let values = Tensor::from_floats([[0.5], [0.8]], &device);
        let old_values = Tensor::from_floats([0.5, 0.8], &device);
        let returns = Tensor::from_floats([0.5, 0.8], &device);

        let loss = agent.compute_value_loss(&values, &old_values, &returns);
        let loss_val: f32 = loss.into_scalar().elem();
        assert!(loss_val.abs() < 1e-7);
    }

    #[test]
    fn test_value_loss_clipping_bounds_movement() {
        let agent = create_test_agent(small_config());
        let device = NdArrayDevice::default();

        // New value moved far from the old one; the clipped branch dominates
        let values = Tensor::from_floats([[10.0]], &device);
        let old_values = Tensor::from_floats([0.0], &device);
        let returns = Tensor::from_floats([0.0], &device);

        let loss = agent.compute_value_loss(&values, &old_values, &returns);
        let loss_val: f32 = loss.into_scalar().elem();

        // max((10-0)^2, (0.2-0)^2) * 0.5 = 50
        assert!((loss_val - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_policy_loss_computation() {
        let agent = create_test_agent(small_config());
        let device = NdArrayDevice::default();

        let action_logits = Tensor::from_floats([[1.0, 2.0, 3.0, 4.0, 0.0]], &device);
        let actions = Tensor::from_ints([2], &device);
        let old_log_probs = Tensor::from_floats([-1.5], &device);
        let advantages = Tensor::from_floats([0.5], &device);

        let (policy_loss, entropy, approx_kl, clip_fraction) =
            agent.compute_policy_loss(&action_logits, &actions, &old_log_probs, &advantages);

        assert_eq!(policy_loss.dims(), [1]);

        // Entropy of a non-degenerate distribution is positive
        let entropy_val: f32 = entropy.into_scalar().elem();
        assert!(entropy_val > 0.0);

        assert!(approx_kl.is_finite());
        assert!((0.0..=1.0).contains(&clip_fraction));
    }

    #[test]
    fn test_sample_categorical_degenerate() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            assert_eq!(sample_categorical(&[0.0, 0.0, 1.0, 0.0, 0.0], &mut rng), 2);
        }
    }

    #[test]
    fn test_integration_with_vec_environment() {
        let device = NdArrayDevice::default();

        let config = small_config();
        let game_config = GameConfig::new(GRID);
        let mut vec_env = VecEnvironment::<TestInferenceBackend>::new(
            config.num_envs,
            game_config,
            LevelSet::default(),
            device.clone(),
        );

        let network_config = ActorCriticConfig::new(GRID, GRID, config.encoder);
        let network = network_config.init::<TestBackend>(&device);
        let mut agent = PPOAgent::new(network, config, device);

        agent.begin_rollout(5);
        let mut observations = vec_env.reset_all();

        while !agent.should_update() {
            let batch = agent.act(observations);
            let result = vec_env.step(&batch.actions);

            agent.store_row(
                batch.observations,
                &batch.actions,
                &batch.log_probs,
                &result.rewards,
                &batch.values,
                &result.dones,
            );
            observations = result.observations;
        }

        let last_values = agent.value_batch(observations);
        let stats = agent.update(&last_values);

        assert!(stats.policy_loss.is_finite());
        assert!(stats.value_loss.is_finite());
        assert!(stats.entropy.is_finite());
    }
}

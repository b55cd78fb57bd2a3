//! Rollout buffer for PPO trajectory collection
//!
//! This module implements a fixed-horizon rollout buffer for storing
//! transitions from a batch of parallel environments and computing advantages
//! using Generalized Advantage Estimation (GAE).

use burn::tensor::{Int, Tensor, TensorData, backend::Backend};
use rand::seq::SliceRandom;

/// Rollout buffer holding `num_steps` rows of `num_envs` transitions each
///
/// Transitions are stored row by row: one call to [`push_row`](Self::push_row)
/// appends the transitions of all parallel environments for one time step.
/// Once the buffer holds a full rollout, [`compute_advantages`](Self::compute_advantages)
/// runs GAE independently per environment along the time axis, and
/// [`get_batch`](Self::get_batch) serves flat minibatches across the whole
/// `num_steps * num_envs` rollout.
///
/// # Example
///
/// ```rust
/// use gridrun::rl::RolloutBuffer;
/// use burn::backend::ndarray::{NdArray, NdArrayDevice};
/// use burn::tensor::Tensor;
///
/// type Backend = NdArray<f32>;
///
/// let device = NdArrayDevice::default();
/// let mut buffer = RolloutBuffer::<Backend>::new(128, 4, device.clone());
///
/// let obs: Vec<_> = (0..4).map(|_| Tensor::zeros([5, 16, 16], &device)).collect();
/// buffer.push_row(obs, &[0; 4], &[-1.0; 4], &[0.1; 4], &[0.5; 4], &[false; 4]);
///
/// assert_eq!(buffer.len(), 4);
/// assert!(!buffer.is_full());
/// ```
pub struct RolloutBuffer<B: Backend> {
    /// Stored observations, flat index `t * num_envs + e`
    observations: Vec<Tensor<B, 3>>,

    /// Action indices taken
    actions: Vec<usize>,

    /// Log probabilities of actions at collection time
    log_probs: Vec<f32>,

    /// Rewards received
    rewards: Vec<f32>,

    /// Value estimates at collection time
    values: Vec<f32>,

    /// Whether the transition ended its episode
    dones: Vec<bool>,

    /// Rows stored so far
    rows: usize,

    /// Rollout horizon in steps
    num_steps: usize,

    /// Number of parallel environments
    num_envs: usize,

    /// Device for tensor operations
    device: B::Device,

    /// Computed advantages (populated after GAE)
    advantages: Option<Vec<f32>>,

    /// Computed returns (populated after GAE)
    returns: Option<Vec<f32>>,
}

impl<B: Backend> RolloutBuffer<B> {
    /// Create a buffer for `num_steps` rows of `num_envs` transitions
    pub fn new(num_steps: usize, num_envs: usize, device: B::Device) -> Self {
        let capacity = num_steps * num_envs;
        Self {
            observations: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            log_probs: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            dones: Vec::with_capacity(capacity),
            rows: 0,
            num_steps,
            num_envs,
            device,
            advantages: None,
            returns: None,
        }
    }

    /// Append one time step of transitions, one per environment
    ///
    /// All slices must have length `num_envs`. `dones[e]` marks whether the
    /// transition ended environment `e`'s episode (the environment is expected
    /// to auto-reset, so the next row's observation belongs to a new episode).
    ///
    /// # Panics
    ///
    /// Panics if any argument's length differs from `num_envs`.
    pub fn push_row(
        &mut self,
        observations: Vec<Tensor<B, 3>>,
        actions: &[usize],
        log_probs: &[f32],
        rewards: &[f32],
        values: &[f32],
        dones: &[bool],
    ) {
        assert_eq!(observations.len(), self.num_envs);
        assert_eq!(actions.len(), self.num_envs);
        assert_eq!(log_probs.len(), self.num_envs);
        assert_eq!(rewards.len(), self.num_envs);
        assert_eq!(values.len(), self.num_envs);
        assert_eq!(dones.len(), self.num_envs);

        if self.rows < self.num_steps {
            self.observations.extend(observations);
            self.actions.extend_from_slice(actions);
            self.log_probs.extend_from_slice(log_probs);
            self.rewards.extend_from_slice(rewards);
            self.values.extend_from_slice(values);
            self.dones.extend_from_slice(dones);
            self.rows += 1;
        }
    }

    /// Check if a full rollout has been collected
    pub fn is_full(&self) -> bool {
        self.rows >= self.num_steps
    }

    /// Total number of stored transitions (`rows * num_envs`)
    pub fn len(&self) -> usize {
        self.rows * self.num_envs
    }

    /// Check if the buffer contains no transitions
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of time-step rows stored
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Mean over environments of the per-environment reward sum
    ///
    /// Each environment's rewards are summed along the stored rollout, then
    /// averaged across environments. Tracks how much raw reward a rollout
    /// collected, independent of the horizon length.
    pub fn mean_reward(&self) -> f32 {
        if self.rewards.is_empty() {
            return 0.0;
        }
        self.rewards.iter().sum::<f32>() / self.num_envs as f32
    }

    /// Compute advantages and returns with Generalized Advantage Estimation
    ///
    /// GAE runs backwards through time independently for each environment:
    ///
    /// ```text
    /// δ_t = r_t + γ * V(s_{t+1}) * (1 - done_t) - V(s_t)
    /// A_t = δ_t + γλ * A_{t+1} * (1 - done_t)
    /// R_t = A_t + V(s_t)
    /// ```
    ///
    /// A done flag at step t cuts both the bootstrap value and the carried
    /// advantage, so episodes never leak value across an auto-reset boundary.
    /// `last_values[e]` bootstraps the step after the rollout for environment
    /// `e`.
    ///
    /// Advantages are normalized to zero mean and unit variance over the whole
    /// rollout for training stability. Returns are computed from the
    /// unnormalized advantages.
    ///
    /// # Panics
    ///
    /// Panics if `last_values.len() != num_envs`.
    pub fn compute_advantages(&mut self, gamma: f32, gae_lambda: f32, last_values: &[f32]) {
        assert_eq!(last_values.len(), self.num_envs);

        let n = self.len();
        if n == 0 {
            return;
        }

        let mut advantages = vec![0.0; n];
        let mut returns = vec![0.0; n];

        for e in 0..self.num_envs {
            let mut next_value = last_values[e];
            let mut next_advantage = 0.0;

            for t in (0..self.rows).rev() {
                let i = t * self.num_envs + e;
                let mask = if self.dones[i] { 0.0 } else { 1.0 };

                let delta = self.rewards[i] + gamma * next_value * mask - self.values[i];
                next_advantage = delta + gamma * gae_lambda * next_advantage * mask;

                advantages[i] = next_advantage;
                returns[i] = next_advantage + self.values[i];

                next_value = self.values[i];
            }
        }

        // Normalize advantages: (A - mean(A)) / (std(A) + 1e-8)
        let mean = advantages.iter().sum::<f32>() / n as f32;
        let variance = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n as f32;
        let std = variance.sqrt();

        for a in &mut advantages {
            *a = (*a - mean) / (std + 1e-8);
        }

        self.advantages = Some(advantages);
        self.returns = Some(returns);
    }

    /// Get a batch of data for training
    ///
    /// Converts stored data into tensor data ready for a network forward pass.
    ///
    /// # Returns
    ///
    /// A tuple containing:
    /// - observations: `[batch, 5, H, W]`
    /// - actions: `[batch]` (Int type)
    /// - old_log_probs: `[batch]`
    /// - old_values: `[batch]`
    /// - advantages: `[batch]`
    /// - returns: `[batch]`
    ///
    /// # Panics
    ///
    /// Panics if advantages have not been computed yet, or if `indices` is
    /// empty.
    pub fn get_batch(
        &self,
        indices: &[usize],
    ) -> (
        TensorData, // observations [batch, 5, H, W]
        TensorData, // actions [batch] (Int type)
        TensorData, // old_log_probs [batch]
        TensorData, // old_values [batch]
        TensorData, // advantages [batch]
        TensorData, // returns [batch]
    ) {
        let advantages = self
            .advantages
            .as_ref()
            .expect("Advantages must be computed before getting batches");
        let returns = self
            .returns
            .as_ref()
            .expect("Returns must be computed before getting batches");
        assert!(!indices.is_empty(), "Cannot create batch from no indices");

        let obs_batch: Vec<Tensor<B, 3>> = indices
            .iter()
            .map(|&i| self.observations[i].clone())
            .collect();
        let obs_tensor: Tensor<B, 4> = Tensor::stack(obs_batch, 0);

        let actions_data: Vec<i32> = indices.iter().map(|&i| self.actions[i] as i32).collect();
        let actions_tensor = Tensor::<B, 1, Int>::from_ints(actions_data.as_slice(), &self.device);

        let log_probs_data: Vec<f32> = indices.iter().map(|&i| self.log_probs[i]).collect();
        let log_probs_tensor: Tensor<B, 1> =
            Tensor::from_floats(log_probs_data.as_slice(), &self.device);

        let values_data: Vec<f32> = indices.iter().map(|&i| self.values[i]).collect();
        let values_tensor: Tensor<B, 1> = Tensor::from_floats(values_data.as_slice(), &self.device);

        let advantages_data: Vec<f32> = indices.iter().map(|&i| advantages[i]).collect();
        let advantages_tensor: Tensor<B, 1> =
            Tensor::from_floats(advantages_data.as_slice(), &self.device);

        let returns_data: Vec<f32> = indices.iter().map(|&i| returns[i]).collect();
        let returns_tensor: Tensor<B, 1> =
            Tensor::from_floats(returns_data.as_slice(), &self.device);

        (
            obs_tensor.into_data(),
            actions_tensor.into_data(),
            log_probs_tensor.into_data(),
            values_tensor.into_data(),
            advantages_tensor.into_data(),
            returns_tensor.into_data(),
        )
    }

    /// Sample random batch indices for minibatch training
    ///
    /// Shuffles all transition indices and splits them into chunks. The last
    /// batch may be smaller if the rollout size is not evenly divisible by the
    /// batch size.
    pub fn sample_indices(&self, batch_size: usize) -> Vec<Vec<usize>> {
        let n = self.len();
        let mut indices: Vec<usize> = (0..n).collect();

        let mut rng = rand::thread_rng();
        indices.shuffle(&mut rng);

        indices.chunks(batch_size).map(|c| c.to_vec()).collect()
    }

    /// Clear the buffer for the next rollout
    pub fn clear(&mut self) {
        self.observations.clear();
        self.actions.clear();
        self.log_probs.clear();
        self.rewards.clear();
        self.values.clear();
        self.dones.clear();
        self.rows = 0;
        self.advantages = None;
        self.returns = None;
    }
}

//! Observation augmentation for generalization
//!
//! Random convolution passes observations through a freshly sampled, untrained
//! 3x3 convolution. The filter is resampled for every rollout, so the agent
//! sees a different random recoloring of the same level layout each time it
//! collects data. This discourages the policy from keying on exact channel
//! statistics and improves transfer to held-out levels.

use burn::tensor::ops::ConvOptions;
use burn::tensor::{Distribution, Tensor, backend::Backend, module::conv2d};

/// A sampled random convolution filter
///
/// The filter maps `channels` input planes to `channels` output planes with a
/// 3x3 kernel and padding 1, so observation shape is preserved. The weight is
/// a plain tensor rather than a module parameter: it is never trained, only
/// resampled.
#[derive(Debug, Clone)]
pub struct RandConv<B: Backend> {
    weight: Tensor<B, 4>,
}

impl<B: Backend> RandConv<B> {
    /// Sample a fresh filter for observations with `channels` planes
    pub fn sample(channels: usize, device: &B::Device) -> Self {
        // Kaiming-style uniform bound for a 3x3 kernel
        let bound = (1.0 / (channels as f64 * 9.0)).sqrt();
        let weight = Tensor::random(
            [channels, channels, 3, 3],
            Distribution::Uniform(-bound, bound),
            device,
        );
        Self { weight }
    }

    /// Apply the filter to a batch of observations
    ///
    /// Input and output both have shape `[batch, channels, height, width]`.
    pub fn apply(&self, observations: Tensor<B, 4>) -> Tensor<B, 4> {
        conv2d(
            observations,
            self.weight.clone(),
            None,
            ConvOptions::new([1, 1], [1, 1], [1, 1], 1),
        )
    }
}

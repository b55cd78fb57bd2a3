//! Actor-Critic neural network for the grid agent
//!
//! This module implements a convolutional network with two heads:
//! - **Actor head**: Outputs action logits for the policy (5 actions)
//! - **Critic head**: Outputs value estimate for state evaluation
//!
//! Two encoder architectures share the same heads:
//!
//! ```text
//! Nature encoder:
//! Input: [batch, 5, H, W]
//!   Conv2d(5→32, k=3, p=1) + ReLU
//!   Conv2d(32→64, k=3, p=1) + ReLU
//!   Conv2d(64→64, k=3, p=1) + ReLU
//!   Flatten → Linear(64*H*W → hidden) + ReLU
//!
//! Impala encoder:
//! Input: [batch, 5, H, W]
//!   3 blocks, channels [16, 32, 32], each:
//!     Conv2d(k=3, p=1) → MaxPool(k=3, s=2, p=1) → 2 residual units
//!   ReLU → Flatten → Linear(32*(H/8)*(W/8) → hidden) + ReLU
//! ```
//!
//! Head weights use Xavier-normal initialization with a small gain (0.01) on
//! the actor so the initial policy is close to uniform over actions.
//!
//! # Example
//!
//! ```rust
//! use gridrun::rl::{ActorCriticConfig, EncoderKind};
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let config = ActorCriticConfig::new(16, 16, EncoderKind::Impala);
//! let network = config.init::<Backend>(&device);
//!
//! let observation = Tensor::zeros([4, 5, 16, 16], &device);
//! let (action_logits, value) = network.forward(observation);
//!
//! assert_eq!(action_logits.dims(), [4, 5]); // [batch, num_actions]
//! assert_eq!(value.dims(), [4, 1]);         // [batch, 1]
//! ```

use burn::{
    module::Module,
    nn::{
        Initializer, Linear, LinearConfig, PaddingConfig2d,
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
    },
    tensor::{Tensor, activation::relu, backend::Backend},
};

use crate::game::NUM_ACTIONS;
use crate::rl::config::EncoderKind;
use crate::rl::observation::NUM_OBS_CHANNELS;

/// Configuration for the Actor-Critic network
#[derive(Debug, Clone)]
pub struct ActorCriticConfig {
    /// Number of input channels
    pub input_channels: usize,

    /// Number of actions the policy can output
    pub num_actions: usize,

    /// Grid height in cells
    pub grid_height: usize,

    /// Grid width in cells
    pub grid_width: usize,

    /// Which encoder architecture to build
    pub encoder: EncoderKind,

    /// Hidden dimension between the encoder and the heads (default: 256)
    pub hidden_dim: usize,
}

/// Spatial size after one 3x3 stride-2 padding-1 max pool
fn pooled(n: usize) -> usize {
    (n + 2 - 3) / 2 + 1
}

impl ActorCriticConfig {
    /// Create a new configuration with default hyperparameters
    ///
    /// # Example
    ///
    /// ```rust
    /// use gridrun::rl::{ActorCriticConfig, EncoderKind};
    ///
    /// let config = ActorCriticConfig::new(16, 16, EncoderKind::Impala);
    /// ```
    pub fn new(grid_height: usize, grid_width: usize, encoder: EncoderKind) -> Self {
        Self {
            input_channels: NUM_OBS_CHANNELS,
            num_actions: NUM_ACTIONS,
            grid_height,
            grid_width,
            encoder,
            hidden_dim: 256,
        }
    }

    /// Initialize the Actor-Critic network from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCriticNetwork<B> {
        let encoder = match self.encoder {
            EncoderKind::Nature => Encoder::Nature(NatureEncoder::init(self, device)),
            EncoderKind::Impala => Encoder::Impala(ImpalaEncoder::init(self, device)),
        };

        ActorCriticNetwork {
            encoder,
            actor_head: LinearConfig::new(self.hidden_dim, self.num_actions)
                .with_initializer(Initializer::XavierNormal { gain: 0.01 })
                .init(device),
            critic_head: LinearConfig::new(self.hidden_dim, 1)
                .with_initializer(Initializer::XavierNormal { gain: 1.0 })
                .init(device),
        }
    }
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self::new(16, 16, EncoderKind::Impala)
    }
}

fn conv3x3<B: Backend>(channels: [usize; 2], device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new(channels, [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

/// Plain three-layer convolutional encoder
#[derive(Module, Debug)]
pub struct NatureEncoder<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    fc: Linear<B>,
}

impl<B: Backend> NatureEncoder<B> {
    fn init(config: &ActorCriticConfig, device: &B::Device) -> Self {
        // Convolutions preserve spatial dimensions (padding=1, stride=1, kernel=3)
        let flattened_dim = 64 * config.grid_height * config.grid_width;
        Self {
            conv1: conv3x3([config.input_channels, 32], device),
            conv2: conv3x3([32, 64], device),
            conv3: conv3x3([64, 64], device),
            fc: LinearConfig::new(flattened_dim, config.hidden_dim).init(device),
        }
    }

    fn forward(&self, observation: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.conv1.forward(observation));
        let x = relu(self.conv2.forward(x));
        let x = relu(self.conv3.forward(x));

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);
        relu(self.fc.forward(x))
    }
}

/// One residual unit: relu → conv → relu → conv, plus skip connection
#[derive(Module, Debug)]
pub struct ResidualUnit<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
}

impl<B: Backend> ResidualUnit<B> {
    fn init(channels: usize, device: &B::Device) -> Self {
        Self {
            conv1: conv3x3([channels, channels], device),
            conv2: conv3x3([channels, channels], device),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv1.forward(relu(input.clone()));
        let x = self.conv2.forward(relu(x));
        x + input
    }
}

/// One encoder block: conv, downsampling max pool, two residual units
#[derive(Module, Debug)]
pub struct ImpalaBlock<B: Backend> {
    conv: Conv2d<B>,
    pool: MaxPool2d,
    res1: ResidualUnit<B>,
    res2: ResidualUnit<B>,
}

impl<B: Backend> ImpalaBlock<B> {
    fn init(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: conv3x3([in_channels, out_channels], device),
            pool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),
            res1: ResidualUnit::init(out_channels, device),
            res2: ResidualUnit::init(out_channels, device),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = self.pool.forward(x);
        let x = self.res1.forward(x);
        self.res2.forward(x)
    }
}

/// Residual encoder: three blocks with channels [16, 32, 32]
#[derive(Module, Debug)]
pub struct ImpalaEncoder<B: Backend> {
    blocks: Vec<ImpalaBlock<B>>,
    fc: Linear<B>,
}

impl<B: Backend> ImpalaEncoder<B> {
    const CHANNELS: [usize; 3] = [16, 32, 32];

    fn init(config: &ActorCriticConfig, device: &B::Device) -> Self {
        let mut blocks = Vec::with_capacity(Self::CHANNELS.len());
        let mut in_channels = config.input_channels;
        for &out_channels in Self::CHANNELS.iter() {
            blocks.push(ImpalaBlock::init(in_channels, out_channels, device));
            in_channels = out_channels;
        }

        // Each block halves the spatial resolution via its pool
        let mut height = config.grid_height;
        let mut width = config.grid_width;
        for _ in 0..Self::CHANNELS.len() {
            height = pooled(height);
            width = pooled(width);
        }
        let flattened_dim = Self::CHANNELS[2] * height * width;

        Self {
            blocks,
            fc: LinearConfig::new(flattened_dim, config.hidden_dim).init(device),
        }
    }

    fn forward(&self, observation: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = observation;
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = relu(x);

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);
        relu(self.fc.forward(x))
    }
}

/// Encoder trunk: either architecture, selected at construction
#[derive(Module, Debug)]
pub enum Encoder<B: Backend> {
    Nature(NatureEncoder<B>),
    Impala(ImpalaEncoder<B>),
}

impl<B: Backend> Encoder<B> {
    fn forward(&self, observation: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            Encoder::Nature(encoder) => encoder.forward(observation),
            Encoder::Impala(encoder) => encoder.forward(observation),
        }
    }
}

/// Actor-Critic convolutional network
///
/// Processes grid observations through a shared encoder trunk and outputs both
/// action logits (policy) and value estimates (critic).
///
/// The network is generic over the Backend, allowing it to run on different
/// hardware and support automatic differentiation for training (Autodiff
/// wrapper).
#[derive(Module, Debug)]
pub struct ActorCriticNetwork<B: Backend> {
    /// Shared convolutional trunk
    encoder: Encoder<B>,
    /// Actor head: outputs action logits
    actor_head: Linear<B>,
    /// Critic head: outputs value estimate
    critic_head: Linear<B>,
}

impl<B: Backend> ActorCriticNetwork<B> {
    /// Forward pass through the network
    ///
    /// # Arguments
    ///
    /// * `observation` - Tensor with shape `[batch, 5, height, width]`
    ///
    /// # Returns
    ///
    /// A tuple of:
    /// - `action_logits`: Tensor with shape `[batch, num_actions]`
    /// - `value`: Tensor with shape `[batch, 1]`
    pub fn forward(&self, observation: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let features = self.encoder.forward(observation);

        let action_logits = self.actor_head.forward(features.clone());
        let value = self.critic_head.forward(features);

        (action_logits, value)
    }
}

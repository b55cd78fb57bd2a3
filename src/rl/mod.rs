//! Reinforcement learning stack for the grid game
//!
//! Provides:
//! - 5-channel grid observations (agent, coins, walls, hazards, goal)
//! - Burn-compatible single and vectorized environment interfaces
//! - Actor-Critic network with selectable encoder architectures
//! - Random convolution observation augmentation
//! - PPO algorithm configuration, training, and model persistence

pub mod augment;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod environment;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod ppo;
pub mod vec_env;

pub use augment::RandConv;
pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use buffer::RolloutBuffer;
pub use config::{Augmentation, EncoderKind, PPOConfig};
pub use environment::GridEnvironment;
pub use network::{ActorCriticConfig, ActorCriticNetwork};
pub use observation::{NUM_OBS_CHANNELS, create_observation};
pub use persistence::{ModelMetadata, load_network, save_model};
pub use ppo::{ActionBatch, PPOAgent, UpdateStats};
pub use vec_env::{EpisodeRecord, VecEnvironment, VecStep};

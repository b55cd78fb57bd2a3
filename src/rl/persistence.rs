//! Model persistence for saving and loading trained agents
//!
//! This module provides functionality to save and load trained PPO agents,
//! including both the network weights and training metadata. It uses Burn's
//! Record system for serialization.

use super::{ActorCriticConfig, ActorCriticNetwork, PPOAgent, PPOConfig};
use crate::game::{GameConfig, LevelSet};
use anyhow::{Context, Result};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata saved with the model
///
/// Contains configuration and training information needed to properly
/// reconstruct and use the saved model. The game configuration is stored in
/// full so evaluation and playback run the exact environment the agent
/// trained in, and the level set records which seeds it trained on so
/// evaluation can pick disjoint held-out seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// PPO configuration used during training
    pub ppo_config: PPOConfig,

    /// Game configuration the agent trained in
    pub game_config: GameConfig,

    /// Level seeds the agent trained on
    pub levels: LevelSet,

    /// Number of PPO updates completed
    pub updates: usize,

    /// Total environment steps completed
    pub env_steps: usize,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl ModelMetadata {
    /// Create new metadata
    pub fn new(
        ppo_config: PPOConfig,
        game_config: GameConfig,
        levels: LevelSet,
        updates: usize,
        env_steps: usize,
    ) -> Self {
        Self {
            ppo_config,
            game_config,
            levels,
            updates,
            env_steps,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Save a trained PPO agent to a file
///
/// Serializes both the neural network weights and training metadata to the
/// specified path. Creates parent directories if they don't exist.
///
/// The model is saved in two files:
/// - `<path>` - Network weights (Burn record format)
/// - `<path>.meta.json` - Metadata as JSON
pub fn save_model<B: AutodiffBackend>(
    agent: &PPOAgent<B>,
    game_config: &GameConfig,
    levels: LevelSet,
    env_steps: usize,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let network = agent.network();
    let record = network.clone().into_record();

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(record, path.to_path_buf())
        .context("Failed to save network weights")?;

    let metadata = ModelMetadata::new(
        agent.config().clone(),
        game_config.clone(),
        levels,
        agent.training_step(),
        env_steps,
    );

    let meta_path = path.with_extension("meta.json");
    let meta_json =
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Load a trained network from a file
///
/// Deserializes a previously saved model, returning both the network and its
/// associated metadata. The encoder architecture is reconstructed from the
/// saved PPO configuration, so the record shapes line up.
pub fn load_network<B: AutodiffBackend>(
    path: &Path,
    device: &B::Device,
) -> Result<(ActorCriticNetwork<B>, ModelMetadata)> {
    let meta_path = path.with_extension("meta.json");
    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    let metadata: ModelMetadata =
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")?;

    let network_config = ActorCriticConfig::new(
        metadata.game_config.grid_height,
        metadata.game_config.grid_width,
        metadata.ppo_config.encoder,
    );
    let mut network = network_config.init::<B>(device);

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load network weights from {:?}", path))?;

    network = network.load_record(record);

    Ok((network, metadata))
}

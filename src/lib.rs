//! GridRun - procedurally generated grid navigation with PPO training
//!
//! This library provides:
//! - Core game logic and level generation (game module)
//! - PPO training infrastructure on the Burn framework (rl module)
//! - Training and evaluation metrics (metrics module)
//! - TUI rendering (render module)
//! - Execution modes: train, evaluate, visualize (modes module)

pub mod game;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;

//! Core game logic: procedurally generated grid levels
//!
//! This module contains all the game logic without any I/O or rendering
//! dependencies. It can be used programmatically for both RL training and
//! policy visualization.

pub mod action;
pub mod config;
pub mod engine;
pub mod level;
pub mod state;

// Re-export commonly used types
pub use action::{action_from_index, Action, Direction, NUM_ACTIONS};
pub use config::{GameConfig, LevelSet};
pub use engine::{GameEngine, StepInfo, StepResult};
pub use level::{Level, Tile};
pub use state::{GameState, Position};

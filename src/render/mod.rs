//! TUI rendering for the grid game

pub mod renderer;

pub use renderer::{PlaybackInfo, Renderer};

use serde::{Deserialize, Serialize};

/// Configuration for the grid game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the game grid (including border walls)
    pub grid_width: usize,
    /// Height of the game grid (including border walls)
    pub grid_height: usize,
    /// Fraction of interior cells filled with extra walls
    pub wall_density: f32,
    /// Fraction of interior cells filled with hazards
    pub hazard_density: f32,
    /// Number of coins scattered per level
    pub num_coins: usize,
    /// Maximum steps before an episode times out
    pub max_episode_steps: u32,

    // Rewards (for RL)
    /// Reward for collecting a coin
    pub coin_reward: f32,
    /// Reward for reaching the goal
    pub goal_reward: f32,
    /// Penalty for each step (encourages efficiency)
    pub step_penalty: f32,
    /// Penalty for stepping onto a hazard
    pub death_penalty: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 16,
            grid_height: 16,
            wall_density: 0.15,
            hazard_density: 0.05,
            num_coins: 4,
            max_episode_steps: 256,
            coin_reward: 1.0,
            goal_reward: 10.0,
            step_penalty: -0.01,
            death_penalty: -10.0,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom square grid size
    pub fn new(size: usize) -> Self {
        Self {
            grid_width: size,
            grid_height: size,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_width < 5 || self.grid_height < 5 {
            return Err(format!(
                "grid must be at least 5x5, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }

        if !(0.0..1.0).contains(&self.wall_density) {
            return Err(format!(
                "wall_density must be in [0, 1), got {}",
                self.wall_density
            ));
        }

        if !(0.0..1.0).contains(&self.hazard_density) {
            return Err(format!(
                "hazard_density must be in [0, 1), got {}",
                self.hazard_density
            ));
        }

        if self.max_episode_steps == 0 {
            return Err("max_episode_steps must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Range of level seeds an engine may draw episodes from
///
/// Mirrors the level-selection contract of procedurally generated
/// benchmark environments: episodes sample uniformly from
/// `start_level .. start_level + num_levels`, and `num_levels == 0`
/// means the full unbounded seed space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelSet {
    /// First level seed of the range
    pub start_level: u64,
    /// Number of distinct levels (0 = unlimited)
    pub num_levels: u64,
}

impl LevelSet {
    pub fn new(start_level: u64, num_levels: u64) -> Self {
        Self {
            start_level,
            num_levels,
        }
    }

    /// A held-out range starting immediately after this one
    ///
    /// Used for evaluation on levels the agent never trained on. For an
    /// unbounded set this returns another unbounded set (every range
    /// overlaps anyway).
    pub fn held_out(&self, num_levels: u64) -> Self {
        if self.num_levels == 0 {
            Self::new(0, 0)
        } else {
            Self::new(self.start_level + self.num_levels, num_levels)
        }
    }

    /// Whether a seed belongs to this set
    pub fn contains(&self, seed: u64) -> bool {
        if self.num_levels == 0 {
            true
        } else {
            (self.start_level..self.start_level + self.num_levels).contains(&seed)
        }
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::new(0, 200)
    }
}

impl std::fmt::Display for LevelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.num_levels == 0 {
            write!(f, "unbounded from seed {}", self.start_level)
        } else {
            write!(
                f,
                "seeds {}..{}",
                self.start_level,
                self.start_level + self.num_levels
            )
        }
    }
}

use super::observation::create_observation;
use crate::game::{GameConfig, GameEngine, GameState, LevelSet, action_from_index};
use burn::tensor::{Tensor, backend::Backend};

/// Grid environment for reinforcement learning
///
/// Wraps the game engine and provides a Burn-compatible RL interface with:
/// - Tensor observations (5-channel grid)
/// - Discrete action space (5 actions: Up, Down, Left, Right, Stay)
/// - Standard RL interface (reset, step)
///
/// Each reset samples a new level seed from the environment's [`LevelSet`],
/// so an agent trained on a bounded set can be evaluated on held-out seeds by
/// constructing a second environment over a disjoint range.
pub struct GridEnvironment<B: Backend> {
    engine: GameEngine,
    state: GameState,
    device: B::Device,
}

impl<B: Backend> GridEnvironment<B> {
    /// Create a new grid environment drawing levels from `levels`
    pub fn new(config: GameConfig, levels: LevelSet, device: B::Device) -> Self {
        let mut engine = GameEngine::new(config, levels);
        let state = engine.reset();
        Self {
            engine,
            state,
            device,
        }
    }

    /// Reset the environment to a freshly sampled level
    ///
    /// Returns: Tensor<B, 3> with shape [5, height, width]
    pub fn reset(&mut self) -> Tensor<B, 3> {
        self.state = self.engine.reset();
        create_observation(&self.state, &self.device)
    }

    /// Reset the environment to a specific level seed
    pub fn reset_to(&mut self, seed: u64) -> Tensor<B, 3> {
        self.state = self.engine.reset_to(seed);
        create_observation(&self.state, &self.device)
    }

    /// Step the environment with a discrete action
    ///
    /// Actions:
    /// - 0: Move Up
    /// - 1: Move Down
    /// - 2: Move Left
    /// - 3: Move Right
    /// - 4: Stay
    ///
    /// Returns: (observation, reward, done)
    /// - observation: Tensor<B, 3> with shape [5, height, width]
    /// - reward: f32
    /// - done: bool (true if the episode terminated)
    pub fn step(&mut self, action_idx: usize) -> (Tensor<B, 3>, f32, bool) {
        let action = action_from_index(action_idx);
        let step_result = self.engine.step(&mut self.state, action);

        let observation = create_observation(&self.state, &self.device);
        let reward = step_result.reward;
        let done = step_result.terminated;

        (observation, reward, done)
    }

    /// Get current observation without stepping
    ///
    /// Returns: Tensor<B, 3> with shape [5, height, width]
    pub fn get_observation(&self) -> Tensor<B, 3> {
        create_observation(&self.state, &self.device)
    }

    /// Get the device used by this environment
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Get reference to current game state (for rendering/debugging)
    pub fn state(&self) -> &GameState {
        &self.state
    }
}

use super::{
    action::Action,
    config::{GameConfig, LevelSet},
    level::Level,
    state::GameState,
};
use rand::Rng;

/// Information about a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    /// Whether the agent collected a coin this step
    pub collected_coin: bool,
    /// Whether the agent reached the goal this step
    pub reached_goal: bool,
    /// Whether the agent stepped onto a hazard
    pub hit_hazard: bool,
    /// Whether the episode hit its step limit
    pub timed_out: bool,
}

impl StepInfo {
    fn none() -> Self {
        Self {
            collected_coin: false,
            reached_goal: false,
            hit_hazard: false,
            timed_out: false,
        }
    }
}

/// Result of a game step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// Reward for this step (for RL training)
    pub reward: f32,
    /// Whether the episode has terminated
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

/// The game engine: draws levels from a seed range and steps episodes
pub struct GameEngine {
    config: GameConfig,
    levels: LevelSet,
    rng: rand::rngs::ThreadRng,
}

impl GameEngine {
    /// Create a new game engine drawing episodes from the given level set
    pub fn new(config: GameConfig, levels: LevelSet) -> Self {
        Self {
            config,
            levels,
            rng: rand::thread_rng(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a fresh episode on a level drawn from the level set
    pub fn reset(&mut self) -> GameState {
        let seed = self.draw_seed();
        self.reset_to(seed)
    }

    /// Start a fresh episode on a specific level seed
    pub fn reset_to(&mut self, seed: u64) -> GameState {
        let level = Level::generate(seed, &self.config);
        GameState::new(level)
    }

    /// Execute one step of the game
    pub fn step(&mut self, state: &mut GameState, action: Action) -> StepResult {
        if state.terminated {
            return StepResult {
                reward: 0.0,
                terminated: true,
                info: StepInfo::none(),
            };
        }

        // Resolve movement; walls (and the border) block, leaving the
        // agent in place but still consuming the step.
        let target = match action {
            Action::Move(direction) => state.agent.moved_in_direction(direction),
            Action::Stay => state.agent,
        };
        if !state.level.is_wall(target) {
            state.agent = target;
        }

        state.steps += 1;
        let mut reward = self.config.step_penalty;
        let mut info = StepInfo::none();

        if state.level.is_hazard(state.agent) {
            state.is_alive = false;
            state.terminated = true;
            info.hit_hazard = true;
            reward += self.config.death_penalty;
            return StepResult {
                reward,
                terminated: true,
                info,
            };
        }

        if let Some(idx) = state.coins.iter().position(|&c| c == state.agent) {
            state.coins.swap_remove(idx);
            state.score += 1;
            reward += self.config.coin_reward;
            info.collected_coin = true;
        }

        if state.agent == state.level.goal {
            state.reached_goal = true;
            state.terminated = true;
            info.reached_goal = true;
            reward += self.config.goal_reward;
            return StepResult {
                reward,
                terminated: true,
                info,
            };
        }

        if state.steps >= self.config.max_episode_steps {
            state.terminated = true;
            info.timed_out = true;
            return StepResult {
                reward,
                terminated: true,
                info,
            };
        }

        StepResult {
            reward,
            terminated: false,
            info,
        }
    }

    fn draw_seed(&mut self) -> u64 {
        if self.levels.num_levels == 0 {
            self.rng.gen::<u64>()
        } else {
            self.levels.start_level + self.rng.gen_range(0..self.levels.num_levels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Direction;
    use crate::game::state::Position;

    fn test_engine() -> GameEngine {
        GameEngine::new(GameConfig::default(), LevelSet::new(0, 10))
    }

    #[test]
    fn test_reset_draws_from_level_set() {
        let mut engine = test_engine();
        for _ in 0..20 {
            let state = engine.reset();
            assert!((0..10).contains(&state.level.seed));
            assert!(!state.terminated);
        }
    }

    #[test]
    fn test_reset_unbounded_set_draws_any_seed() {
        let mut engine = GameEngine::new(GameConfig::default(), LevelSet::new(0, 0));

        // With num_levels == 0 the whole u64 seed space is in play, so 20
        // draws landing in any tiny fixed range is vanishingly unlikely
        let mut seen_outside_small_range = false;
        for _ in 0..20 {
            let state = engine.reset();
            assert!(!state.terminated);
            if state.level.seed >= 1000 {
                seen_outside_small_range = true;
            }
        }
        assert!(seen_outside_small_range);
    }

    #[test]
    fn test_reset_to_is_deterministic() {
        let mut engine = test_engine();
        let a = engine.reset_to(5);
        let b = engine.reset_to(5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stay_costs_a_step() {
        let mut engine = test_engine();
        let mut state = engine.reset_to(0);

        let result = engine.step(&mut state, Action::Stay);

        assert!(!result.terminated);
        assert_eq!(state.steps, 1);
        assert!((result.reward - engine.config().step_penalty).abs() < 1e-6);
    }

    #[test]
    fn test_wall_blocks_movement() {
        let mut engine = test_engine();
        let mut state = engine.reset_to(0);

        // Start column is 1, so moving left runs into the border wall
        let before = state.agent;
        let result = engine.step(&mut state, Action::Move(Direction::Left));

        assert_eq!(state.agent, before);
        assert!(!result.terminated);
        assert_eq!(state.steps, 1);
    }

    #[test]
    fn test_coin_pickup() {
        let mut engine = test_engine();
        let mut state = engine.reset_to(0);

        // Plant a coin right of the agent (the start cell's right neighbor
        // lies on the carved corridor or is empty in either case, but place
        // the agent next to a known coin to be safe).
        let coin = state.agent.moved_by(1, 0);
        if state.level.is_wall(coin) || state.level.is_hazard(coin) {
            return; // layout dependent; other seeds cover the rest
        }
        state.coins = vec![coin];

        let result = engine.step(&mut state, Action::Move(Direction::Right));

        assert!(result.info.collected_coin);
        assert_eq!(state.score, 1);
        assert!(state.coins.is_empty());
        assert!(result.reward > 0.0);
    }

    #[test]
    fn test_goal_terminates_with_reward() {
        let mut engine = test_engine();
        let mut state = engine.reset_to(0);

        // Teleport next to the goal
        let goal = state.level.goal;
        state.agent = Position::new(goal.x - 1, goal.y);
        if state.level.is_wall(state.agent) || state.level.is_hazard(state.agent) {
            state.agent = Position::new(goal.x, goal.y - 1);
        }

        let direction = if state.agent.x < goal.x {
            Direction::Right
        } else {
            Direction::Down
        };
        let result = engine.step(&mut state, Action::Move(direction));

        // Either the agent reached the goal, or it died on a hazard next to
        // it; both terminate.
        if result.info.reached_goal {
            assert!(state.reached_goal);
            assert!(result.reward > engine.config().goal_reward - 1.0);
        }
        assert!(state.agent != goal || result.terminated);
    }

    #[test]
    fn test_hazard_kills() {
        let mut engine = test_engine();
        let mut state = engine.reset_to(0);

        // Find any hazard and teleport next to it
        let Some(hazard) = state.level.hazard_positions().next() else {
            return; // seed 0 may have no hazards at default density
        };
        state.agent = Position::new(hazard.x - 1, hazard.y);
        if state.level.is_wall(state.agent) {
            return;
        }

        let result = engine.step(&mut state, Action::Move(Direction::Right));

        assert!(result.terminated);
        assert!(result.info.hit_hazard);
        assert!(!state.is_alive);
        assert!(result.reward < 0.0);
    }

    #[test]
    fn test_timeout_terminates() {
        let mut config = GameConfig::default();
        config.max_episode_steps = 3;
        let mut engine = GameEngine::new(config, LevelSet::new(0, 1));
        let mut state = engine.reset_to(0);

        engine.step(&mut state, Action::Stay);
        engine.step(&mut state, Action::Stay);
        let result = engine.step(&mut state, Action::Stay);

        assert!(result.terminated);
        assert!(result.info.timed_out);
        assert!(state.is_alive); // timeout is not a death
    }

    #[test]
    fn test_terminated_state_is_a_noop() {
        let mut engine = test_engine();
        let mut state = engine.reset_to(0);
        state.terminated = true;
        let steps_before = state.steps;

        let result = engine.step(&mut state, Action::Stay);

        assert!(result.terminated);
        assert_eq!(result.reward, 0.0);
        assert_eq!(state.steps, steps_before);
    }
}

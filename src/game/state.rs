use super::action::Direction;
use super::level::Level;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

/// Complete state of one episode
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// The level being played
    pub level: Level,
    /// Current agent position
    pub agent: Position,
    /// Coins not yet collected
    pub coins: Vec<Position>,
    /// Coins collected so far
    pub score: u32,
    /// Steps taken in this episode
    pub steps: u32,
    /// False once the agent stepped onto a hazard
    pub is_alive: bool,
    /// True once the agent reached the goal
    pub reached_goal: bool,
    /// True once the episode is over (death, goal, or timeout)
    pub terminated: bool,
}

impl GameState {
    /// Create a fresh state at the start of a level
    pub fn new(level: Level) -> Self {
        let agent = level.start;
        let coins = level.coins.clone();
        Self {
            level,
            agent,
            coins,
            score: 0,
            steps: 0,
            is_alive: true,
            reached_goal: false,
            terminated: false,
        }
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x < self.level.width as i32
            && pos.y >= 0
            && pos.y < self.level.height as i32
    }

    /// Whether a coin remains at this position
    pub fn has_coin(&self, pos: Position) -> bool {
        self.coins.contains(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_in_direction(Direction::Up), Position::new(5, 4));
        assert_eq!(pos.moved_in_direction(Direction::Down), Position::new(5, 6));
    }

    #[test]
    fn test_fresh_state() {
        let level = Level::generate(7, &GameConfig::default());
        let state = GameState::new(level);

        assert!(state.is_alive);
        assert!(!state.reached_goal);
        assert!(!state.terminated);
        assert_eq!(state.score, 0);
        assert_eq!(state.steps, 0);
        assert_eq!(state.agent, state.level.start);
        assert_eq!(state.coins.len(), state.level.coins.len());
    }

    #[test]
    fn test_bounds_checking() {
        let level = Level::generate(0, &GameConfig::default());
        let state = GameState::new(level);

        assert!(state.is_in_bounds(Position::new(0, 0)));
        assert!(state.is_in_bounds(Position::new(15, 15)));
        assert!(!state.is_in_bounds(Position::new(-1, 0)));
        assert!(!state.is_in_bounds(Position::new(16, 0)));
    }
}

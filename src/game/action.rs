/// Direction the agent can move on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the delta (dx, dy) for moving in this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Action that can be taken in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move one cell in a direction (blocked by walls)
    Move(Direction),
    /// Stand still for one step
    Stay,
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        Action::Move(direction)
    }
}

/// Number of discrete actions exposed to the policy
pub const NUM_ACTIONS: usize = 5;

/// Map a discrete policy output to a game action
///
/// - 0 → Move Up
/// - 1 → Move Down
/// - 2 → Move Left
/// - 3 → Move Right
/// - 4 → Stay
/// - other → Stay (default for invalid indices)
pub fn action_from_index(idx: usize) -> Action {
    match idx {
        0 => Action::Move(Direction::Up),
        1 => Action::Move(Direction::Down),
        2 => Action::Move(Direction::Left),
        3 => Action::Move(Direction::Right),
        _ => Action::Stay,
    }
}

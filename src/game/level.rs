//! Procedural level generation
//!
//! Levels are a pure function of a `u64` seed: the same seed always produces
//! the same layout. A random monotone corridor from the start cell to the
//! goal cell is carved before walls and hazards are scattered, so every
//! generated level can be completed.

use super::config::GameConfig;
use super::state::Position;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Static content of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Wall,
    Hazard,
}

/// One generated level: static tiles plus start, goal and initial coins
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Seed this level was generated from
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    /// Row-major tile grid
    tiles: Vec<Tile>,
    /// Agent spawn cell (left edge region)
    pub start: Position,
    /// Goal cell (right edge region)
    pub goal: Position,
    /// Initial coin positions
    pub coins: Vec<Position>,
}

impl Level {
    /// Generate the level for `seed` under `config`
    pub fn generate(seed: u64, config: &GameConfig) -> Self {
        let width = config.grid_width;
        let height = config.grid_height;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut tiles = vec![Tile::Empty; width * height];

        // Border walls
        for x in 0..width {
            tiles[x] = Tile::Wall;
            tiles[(height - 1) * width + x] = Tile::Wall;
        }
        for y in 0..height {
            tiles[y * width] = Tile::Wall;
            tiles[y * width + (width - 1)] = Tile::Wall;
        }

        // Start on the left interior column, goal on the right
        let start = Position::new(1, rng.gen_range(1..height as i32 - 1));
        let goal = Position::new(width as i32 - 2, rng.gen_range(1..height as i32 - 1));

        // Carve a monotone corridor from start to goal; these cells stay
        // free of walls and hazards, which keeps the goal reachable.
        let corridor = carve_corridor(start, goal, &mut rng);
        let protected = |pos: &Position| corridor.contains(pos);

        // Scatter interior walls and hazards off the corridor
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let pos = Position::new(x as i32, y as i32);
                if protected(&pos) {
                    continue;
                }
                let roll: f32 = rng.gen();
                let idx = y * width + x;
                if roll < config.wall_density {
                    tiles[idx] = Tile::Wall;
                } else if roll < config.wall_density + config.hazard_density {
                    tiles[idx] = Tile::Hazard;
                }
            }
        }

        // Coins on random empty cells (corridor cells included; coins never
        // block movement)
        let mut empty: Vec<Position> = (1..height - 1)
            .flat_map(|y| (1..width - 1).map(move |x| Position::new(x as i32, y as i32)))
            .filter(|pos| {
                tiles[pos.y as usize * width + pos.x as usize] == Tile::Empty
                    && *pos != start
                    && *pos != goal
            })
            .collect();
        empty.shuffle(&mut rng);
        let coins: Vec<Position> = empty.into_iter().take(config.num_coins).collect();

        Self {
            seed,
            width,
            height,
            tiles,
            start,
            goal,
            coins,
        }
    }

    /// Tile at a position; out-of-bounds counts as wall
    pub fn tile(&self, pos: Position) -> Tile {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return Tile::Wall;
        }
        self.tiles[pos.y as usize * self.width + pos.x as usize]
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.tile(pos) == Tile::Wall
    }

    pub fn is_hazard(&self, pos: Position) -> bool {
        self.tile(pos) == Tile::Hazard
    }

    /// All positions whose tile is a wall (border included)
    pub fn wall_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_of(Tile::Wall)
    }

    /// All positions whose tile is a hazard
    pub fn hazard_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_of(Tile::Hazard)
    }

    fn positions_of(&self, tile: Tile) -> impl Iterator<Item = Position> + '_ {
        self.tiles.iter().enumerate().filter_map(move |(i, &t)| {
            if t == tile {
                Some(Position::new(
                    (i % self.width) as i32,
                    (i / self.width) as i32,
                ))
            } else {
                None
            }
        })
    }
}

/// Walk from `start` to `goal`, each step moving either one cell toward the
/// goal column or one cell toward the goal row, chosen at random. The walk
/// is monotone in both axes so it always terminates at the goal.
fn carve_corridor(start: Position, goal: Position, rng: &mut StdRng) -> Vec<Position> {
    let mut corridor = vec![start];
    let mut current = start;

    while current != goal {
        let dx = (goal.x - current.x).signum();
        let dy = (goal.y - current.y).signum();

        current = if dx != 0 && (dy == 0 || rng.gen_bool(0.5)) {
            current.moved_by(dx, 0)
        } else {
            current.moved_by(0, dy)
        };
        corridor.push(current);
    }

    corridor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    fn reachable(level: &Level, from: Position, to: Position) -> bool {
        // BFS over non-wall, non-hazard cells
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from]);
        seen.insert(from);

        while let Some(pos) = queue.pop_front() {
            if pos == to {
                return true;
            }
            for (dx, dy) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
                let next = pos.moved_by(dx, dy);
                if !level.is_wall(next) && !level.is_hazard(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = GameConfig::default();
        let a = Level::generate(42, &config);
        let b = Level::generate(42, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = GameConfig::default();
        let a = Level::generate(1, &config);
        let b = Level::generate(2, &config);
        assert_ne!(a, b);
    }

    #[test]
    fn test_border_is_walled() {
        let config = GameConfig::default();
        let level = Level::generate(7, &config);

        for x in 0..level.width as i32 {
            assert!(level.is_wall(Position::new(x, 0)));
            assert!(level.is_wall(Position::new(x, level.height as i32 - 1)));
        }
        for y in 0..level.height as i32 {
            assert!(level.is_wall(Position::new(0, y)));
            assert!(level.is_wall(Position::new(level.width as i32 - 1, y)));
        }
    }

    #[test]
    fn test_start_and_goal_are_clear() {
        let config = GameConfig::default();
        for seed in 0..20 {
            let level = Level::generate(seed, &config);
            assert_eq!(level.tile(level.start), Tile::Empty, "seed {}", seed);
            assert_eq!(level.tile(level.goal), Tile::Empty, "seed {}", seed);
            assert_eq!(level.start.x, 1);
            assert_eq!(level.goal.x, level.width as i32 - 2);
        }
    }

    #[test]
    fn test_goal_always_reachable() {
        let config = GameConfig::default();
        for seed in 0..50 {
            let level = Level::generate(seed, &config);
            assert!(
                reachable(&level, level.start, level.goal),
                "goal unreachable in level {}",
                seed
            );
        }
    }

    #[test]
    fn test_coin_count() {
        let config = GameConfig::default();
        let level = Level::generate(3, &config);
        assert_eq!(level.coins.len(), config.num_coins);

        // Coins only on empty cells
        for &coin in &level.coins {
            assert_eq!(level.tile(coin), Tile::Empty);
            assert_ne!(coin, level.start);
            assert_ne!(coin, level.goal);
        }
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let config = GameConfig::default();
        let level = Level::generate(0, &config);
        assert!(level.is_wall(Position::new(-1, 5)));
        assert!(level.is_wall(Position::new(5, -1)));
        assert!(level.is_wall(Position::new(100, 5)));
    }

    #[test]
    fn test_corridor_is_monotone() {
        let mut rng = StdRng::seed_from_u64(9);
        let start = Position::new(1, 8);
        let goal = Position::new(14, 3);
        let corridor = carve_corridor(start, goal, &mut rng);

        assert_eq!(*corridor.first().unwrap(), start);
        assert_eq!(*corridor.last().unwrap(), goal);
        for pair in corridor.windows(2) {
            let dx = (pair[1].x - pair[0].x).abs();
            let dy = (pair[1].y - pair[0].y).abs();
            assert_eq!(dx + dy, 1); // one axis-aligned step at a time
            assert!(pair[1].x >= pair[0].x); // never moves away from the goal column
        }
    }
}

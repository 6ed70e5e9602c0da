//! Core type definitions for the simulation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an organism instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(pub Uuid);

impl OrganismId {
    /// Draw an id from the given RNG so seeded runs hand out the same ids.
    pub fn from_rng(rng: &mut impl Rng) -> Self {
        Self(uuid::Builder::from_random_bytes(rng.gen()).into_uuid())
    }
}

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// Manhattan distance to another position
    pub fn manhattan_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Axis-aligned direction between neighbouring cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn cardinal() -> [Direction; 4] {
        [
            Direction::East,
            Direction::West,
            Direction::South,
            Direction::North,
        ]
    }
}

/// Terrain kind of a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    #[default]
    Unset,
    Land,
    Water,
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerrainKind::Unset => "unset",
            TerrainKind::Land => "land",
            TerrainKind::Water => "water",
        };
        f.write_str(name)
    }
}

/// One addressable grid cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub terrain_kind: TerrainKind,
    pub depth: u8,
    pub cluster_id: Option<u32>,
    pub generated: bool,
}

impl Cell {
    pub fn unset() -> Self {
        Self::default()
    }

    /// Assign terrain and mark the cell as generated.
    pub fn set_terrain(&mut self, kind: TerrainKind, depth: u8) {
        self.terrain_kind = kind;
        self.depth = depth;
        self.generated = true;
    }

    pub fn set_cluster(&mut self, cluster_id: u32) {
        self.cluster_id = Some(cluster_id);
    }

    pub fn reset_terrain(&mut self) {
        *self = Self::unset();
    }

    pub fn is_water(&self) -> bool {
        self.terrain_kind == TerrainKind::Water
    }
}

/// Biological sex, assigned at birth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

/// What an organism eats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    Herbivore,
    Carnivore,
    Omnivore,
}

impl FoodType {
    /// Food items an organism of this type forages for
    pub fn menu(&self) -> &'static [&'static str] {
        match self {
            FoodType::Herbivore => &["grass", "leaves", "berries", "roots"],
            FoodType::Carnivore => &["carrion", "fish", "insects"],
            FoodType::Omnivore => &["berries", "insects", "roots", "fish", "grass"],
        }
    }
}

/// A single item of food held in a stomach
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoodItem(pub String);

impl FoodItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

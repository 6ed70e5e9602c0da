//! Square grid of terrain cells for the world.

use eco_core::{Cell, Direction, Position, TerrainKind};
use serde::{Deserialize, Serialize};

/// A square grid with hard edges, stored row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    side: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            cells: vec![Cell::unset(); side * side],
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Whether the position lies inside the grid on both axes
    pub fn contains(&self, pos: Position) -> bool {
        let side = self.side as i64;
        (0..side).contains(&(pos.x as i64)) && (0..side).contains(&(pos.y as i64))
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.pos_to_index(pos).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.pos_to_index(pos).map(move |index| &mut self.cells[index])
    }

    pub fn terrain_at(&self, pos: Position) -> Option<TerrainKind> {
        self.get(pos).map(|cell| cell.terrain_kind)
    }

    /// Linear index for a position, `None` when it falls outside the grid
    pub fn pos_to_index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.side + pos.x as usize)
        } else {
            None
        }
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index % self.side) as i32;
        let y = (index / self.side) as i32;
        Position::new(x, y)
    }

    /// The in-bounds axis neighbours of a position. Edges do not wrap, so a
    /// cell at the end of a row has no eastern neighbour.
    pub fn neighbors(&self, pos: Position) -> Vec<Position> {
        Direction::cardinal()
            .into_iter()
            .map(|direction| pos.step(direction))
            .filter(|neighbor| self.contains(*neighbor))
            .collect()
    }

    pub fn has_adjacent(&self, pos: Position, kind: TerrainKind) -> bool {
        self.neighbors(pos)
            .into_iter()
            .any(|neighbor| self.terrain_at(neighbor) == Some(kind))
    }

    /// Closest cell of the given kind by Manhattan distance, first in
    /// row-major order on ties
    pub fn nearest(&self, pos: Position, kind: TerrainKind) -> Option<Position> {
        self.iter()
            .filter(|(_, cell)| cell.terrain_kind == kind)
            .map(|(candidate, _)| candidate)
            .min_by_key(|candidate| pos.manhattan_distance(candidate))
    }

    pub fn count(&self, kind: TerrainKind) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.terrain_kind == kind)
            .count()
    }

    /// Return every cell to its unset, ungenerated state
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.reset_terrain();
        }
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.cells.iter_mut()
    }

    /// Iterator over all positions
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10);
        assert_eq!(grid.side(), 10);
        assert_eq!(grid.area(), 100);
        assert_eq!(grid.count(TerrainKind::Unset), 100);
    }

    #[test]
    fn test_out_of_bounds_lookups() {
        let grid = Grid::new(5);
        assert!(grid.get(Position::new(-1, 0)).is_none());
        assert!(grid.get(Position::new(0, 5)).is_none());
        assert!(grid.get(Position::new(4, 4)).is_some());
        assert_eq!(grid.pos_to_index(Position::new(4, 4)), Some(24));
        assert_eq!(grid.index_to_pos(7), Position::new(2, 1));
    }

    #[test]
    fn test_neighbors_do_not_wrap_rows() {
        let grid = Grid::new(5);

        // Last cell of the first row: its +1 index would be the start of row two.
        let end_of_row = Position::new(4, 0);
        let neighbors = grid.neighbors(end_of_row);
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.contains(&Position::new(3, 0)));
        assert!(neighbors.contains(&Position::new(4, 1)));
        assert!(!neighbors.contains(&Position::new(0, 1)));

        let center = grid.neighbors(Position::new(2, 2));
        assert_eq!(center.len(), 4);
    }

    #[test]
    fn test_nearest_and_adjacent() {
        let mut grid = Grid::new(5);
        grid.get_mut(Position::new(4, 4))
            .unwrap()
            .set_terrain(TerrainKind::Water, 3);

        assert_eq!(
            grid.nearest(Position::new(0, 0), TerrainKind::Water),
            Some(Position::new(4, 4))
        );
        assert!(grid.has_adjacent(Position::new(3, 4), TerrainKind::Water));
        assert!(!grid.has_adjacent(Position::new(0, 0), TerrainKind::Water));
    }

    #[test]
    fn test_reset_clears_generation() {
        let mut grid = Grid::new(3);
        grid.get_mut(Position::new(1, 1))
            .unwrap()
            .set_terrain(TerrainKind::Water, 5);
        assert_eq!(grid.count(TerrainKind::Water), 1);

        grid.reset();
        assert_eq!(grid.count(TerrainKind::Water), 0);
        assert!(grid.iter().all(|(_, cell)| !cell.generated));
    }
}

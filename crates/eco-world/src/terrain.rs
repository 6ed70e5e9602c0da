//! Procedural terrain generation: grows connected water clusters on a grid
//! until an exact water coverage is reached, then fills the rest with land.

use crate::grid::Grid;
use eco_core::{Error, GenerationConfig, Position, Result, TerrainKind, WorldConfig};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

const MIN_WATER_DEPTH: u8 = 3;
const MAX_WATER_DEPTH: u8 = 5;
const LAND_DEPTH: u8 = 0;
/// Grid cells per cluster at 100% distribution
const CELLS_PER_CLUSTER: f64 = 30.0;

/// One water cluster grown from a single seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: u32,
    pub seed: Position,
    /// Randomized size hint drawn when the cluster started
    pub target_size: usize,
    pub size: usize,
}

/// Terrain tally of a successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainReport {
    pub target_water_cells: usize,
    pub water_cells: usize,
    pub land_cells: usize,
    pub target_clusters: usize,
    pub clusters: Vec<ClusterSummary>,
    /// Generation passes used, including the successful one
    pub passes: usize,
}

struct PassOutcome {
    water_cells: usize,
    clusters: Vec<ClusterSummary>,
}

/// A cell waiting to spread water to its neighbours
struct FrontierEntry {
    pos: Position,
    layer: u8,
}

pub struct TerrainGenerator {
    world: WorldConfig,
    budget: GenerationConfig,
}

impl TerrainGenerator {
    pub fn new(world: WorldConfig, budget: GenerationConfig) -> Self {
        Self { world, budget }
    }

    /// Ideal number of clusters for a grid of the given area
    pub fn target_clusters(&self, area: usize) -> usize {
        let clusters = ((area as f64 / CELLS_PER_CLUSTER) * (self.world.water_distribution / 100.0))
            .ceil() as usize;
        if self.world.water_percentage > 0.0 && clusters == 0 {
            1
        } else {
            clusters
        }
    }

    pub fn target_water_cells(&self, area: usize) -> usize {
        ((self.world.water_percentage / 100.0) * area as f64).ceil() as usize
    }

    /// Populate every cell of `grid` with water or land.
    ///
    /// Passes that miss the exact water target reset the grid and start
    /// over. Once the pass budget is spent the grid is left reset and
    /// `Error::GenerationUnsatisfiable` is returned.
    #[instrument(skip(self, grid, rng), fields(side = grid.side()))]
    pub fn generate(&self, grid: &mut Grid, rng: &mut impl Rng) -> Result<TerrainReport> {
        self.world.validate()?;

        let area = grid.area();
        if area == 0 {
            return Err(Error::GenerationUnsatisfiable(
                "grid has no cells to host a cluster".to_string(),
            ));
        }
        if self.world.water_percentage > 100.0 {
            return Err(Error::GenerationUnsatisfiable(format!(
                "requested {}% water coverage",
                self.world.water_percentage
            )));
        }

        let target = self.target_water_cells(area);
        let target_clusters = self.target_clusters(area);
        info!(area, target_water_cells = target, target_clusters, "Generating terrain");

        let mut best = 0;
        for pass in 1..=self.budget.max_regenerations {
            grid.reset();
            let outcome = self.run_pass(grid, target, rng);

            if outcome.water_cells == target {
                let land_cells = fill_land(grid);
                info!(
                    pass,
                    water_cells = outcome.water_cells,
                    land_cells,
                    clusters = outcome.clusters.len(),
                    "Terrain generated"
                );
                return Ok(TerrainReport {
                    target_water_cells: target,
                    water_cells: outcome.water_cells,
                    land_cells,
                    target_clusters,
                    clusters: outcome.clusters,
                    passes: pass,
                });
            }

            best = best.max(outcome.water_cells);
            warn!(
                pass,
                water_cells = outcome.water_cells,
                target_water_cells = target,
                "Water target missed, regenerating terrain"
            );
        }

        grid.reset();
        Err(Error::GenerationUnsatisfiable(format!(
            "reached at most {} of {} water cells in {} passes",
            best, target, self.budget.max_regenerations
        )))
    }

    fn run_pass(&self, grid: &mut Grid, target: usize, rng: &mut impl Rng) -> PassOutcome {
        let area = grid.area();
        let max_attempts = area.saturating_mul(self.budget.max_seed_attempts_per_cell);
        let mut water = 0;
        let mut attempts = 0;
        let mut clusters = Vec::new();

        while water < target {
            if attempts == max_attempts {
                debug!(attempts, water_cells = water, "Seed attempts exhausted");
                break;
            }
            attempts += 1;

            let seed = grid.index_to_pos(rng.gen_range(0..area));
            let depth = rng.gen_range(MIN_WATER_DEPTH..=MAX_WATER_DEPTH);
            let cluster_id = clusters.len() as u32 + 1;

            let Some(cell) = grid.get_mut(seed).filter(|cell| !cell.generated) else {
                continue;
            };
            cell.set_terrain(TerrainKind::Water, depth);
            cell.set_cluster(cluster_id);
            water += 1;

            let target_size = self.cluster_target_size(area, rng);
            debug!(cluster = cluster_id, x = seed.x, y = seed.y, target_size, "Cluster started");

            let grown = self.grow_cluster(grid, seed, depth, cluster_id, &mut water, target, rng);
            clusters.push(ClusterSummary {
                id: cluster_id,
                seed,
                target_size,
                size: grown + 1,
            });
        }

        PassOutcome {
            water_cells: water,
            clusters,
        }
    }

    /// Spread water outward from `seed`, returning the number of cells
    /// added. `water` is the pass-wide water count and is never pushed
    /// past `target`.
    #[allow(clippy::too_many_arguments)]
    fn grow_cluster(
        &self,
        grid: &mut Grid,
        seed: Position,
        layer: u8,
        cluster_id: u32,
        water: &mut usize,
        target: usize,
        rng: &mut impl Rng,
    ) -> usize {
        let mut grown = 0;
        let mut frontier = vec![FrontierEntry { pos: seed, layer }];

        while let Some(entry) = frontier.pop() {
            if *water >= target {
                break;
            }

            // Expansion likelihood follows the requested global coverage.
            let chance: u8 = rng.gen_range(0..=100);
            if f64::from(chance) > self.world.water_percentage {
                trace!(x = entry.pos.x, y = entry.pos.y, chance, "Cluster edge stops expanding");
                continue;
            }

            let mut neighbors = grid.neighbors(entry.pos);
            neighbors.shuffle(rng);

            let next_layer = entry.layer.saturating_sub(1).max(1);
            for neighbor in neighbors {
                if *water >= target {
                    break;
                }
                let Some(cell) = grid.get_mut(neighbor).filter(|cell| !cell.generated) else {
                    continue;
                };
                let depth = rng.gen_range(MIN_WATER_DEPTH..=MAX_WATER_DEPTH);
                cell.set_terrain(TerrainKind::Water, depth);
                cell.set_cluster(cluster_id);
                *water += 1;
                grown += 1;

                trace!(x = neighbor.x, y = neighbor.y, depth, layer = next_layer, "Water placed");
                frontier.push(FrontierEntry {
                    pos: neighbor,
                    layer: next_layer,
                });
            }
        }

        grown
    }

    /// Randomized size hint for a new cluster; lower distributions yield
    /// larger hints
    fn cluster_target_size(&self, area: usize, rng: &mut impl Rng) -> usize {
        let low = (area as f64 * 0.25).ceil() as usize;
        let high = (area as f64 * 0.75).ceil() as usize;
        let distribution = self.world.water_distribution;

        let size = (rng.gen_range(low..=high) as f64 * (5.0 / distribution)).floor() as usize;
        if size > area {
            (rng.gen_range(low..=high) as f64 * (1.0 / distribution)).floor() as usize
        } else {
            size
        }
    }
}

/// Mark every cell still unset as land, returning how many were filled
fn fill_land(grid: &mut Grid) -> usize {
    let mut filled = 0;
    for cell in grid.cells_mut().filter(|cell| !cell.generated) {
        cell.set_terrain(TerrainKind::Land, LAND_DEPTH);
        filled += 1;
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashSet, VecDeque};

    fn world(side_length: usize, water_percentage: f64, water_distribution: f64) -> WorldConfig {
        WorldConfig {
            side_length,
            water_percentage,
            water_distribution,
            rainfall_frequency: 0.0,
        }
    }

    fn generate(config: WorldConfig, seed: u64) -> (Grid, Result<TerrainReport>) {
        let mut grid = Grid::new(config.side_length);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let generator = TerrainGenerator::new(config, GenerationConfig::default());
        let report = generator.generate(&mut grid, &mut rng);
        (grid, report)
    }

    #[test]
    fn test_full_coverage_floods_grid() {
        let (grid, report) = generate(world(5, 100.0, 100.0), 1);
        let report = report.unwrap();

        assert_eq!(report.target_water_cells, 25);
        assert_eq!(grid.count(TerrainKind::Water), 25);
        assert_eq!(grid.count(TerrainKind::Land), 0);
        assert_eq!(report.land_cells, 0);
    }

    #[test]
    fn test_zero_coverage_skips_clusters() {
        let (grid, report) = generate(world(5, 0.0, 50.0), 1);
        let report = report.unwrap();

        assert_eq!(grid.count(TerrainKind::Water), 0);
        assert_eq!(grid.count(TerrainKind::Land), 25);
        assert!(report.clusters.is_empty());
        assert_eq!(report.passes, 1);
    }

    #[test]
    fn test_target_clusters() {
        let generator = TerrainGenerator::new(world(5, 10.0, 1.0), GenerationConfig::default());
        assert_eq!(generator.target_clusters(25), 1);

        let generator = TerrainGenerator::new(world(30, 10.0, 50.0), GenerationConfig::default());
        assert_eq!(generator.target_clusters(900), 15);

        let generator = TerrainGenerator::new(world(5, 25.0, 100.0), GenerationConfig::default());
        assert_eq!(generator.target_water_cells(25), 7);
    }

    #[test]
    fn test_overfull_coverage_is_unsatisfiable() {
        let (_, report) = generate(world(5, 120.0, 50.0), 1);
        assert!(matches!(report, Err(Error::GenerationUnsatisfiable(_))));
    }

    #[test]
    fn test_empty_grid_is_unsatisfiable() {
        let (_, report) = generate(world(0, 50.0, 50.0), 1);
        assert!(matches!(report, Err(Error::GenerationUnsatisfiable(_))));
    }

    #[test]
    fn test_exhausted_budget_is_unsatisfiable() {
        let mut grid = Grid::new(6);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let budget = GenerationConfig {
            max_seed_attempts_per_cell: 0,
            max_regenerations: 3,
        };
        let generator = TerrainGenerator::new(world(6, 50.0, 50.0), budget);

        let report = generator.generate(&mut grid, &mut rng);
        assert!(matches!(report, Err(Error::GenerationUnsatisfiable(_))));
        assert!(grid.iter().all(|(_, cell)| !cell.generated));
    }

    #[test]
    fn test_generation_is_reproducible() {
        let (a, _) = generate(world(12, 40.0, 30.0), 77);
        let (b, _) = generate(world(12, 40.0, 30.0), 77);
        let kinds_a: Vec<_> = a.iter().map(|(_, c)| (c.terrain_kind, c.depth)).collect();
        let kinds_b: Vec<_> = b.iter().map(|(_, c)| (c.terrain_kind, c.depth)).collect();
        assert_eq!(kinds_a, kinds_b);
    }

    #[test]
    fn test_water_depths_and_clusters() {
        let (grid, report) = generate(world(16, 35.0, 40.0), 5);
        let report = report.unwrap();

        for (_, cell) in grid.iter() {
            match cell.terrain_kind {
                TerrainKind::Water => {
                    assert!((MIN_WATER_DEPTH..=MAX_WATER_DEPTH).contains(&cell.depth));
                    assert!(cell.cluster_id.is_some());
                }
                TerrainKind::Land => assert_eq!(cell.cluster_id, None),
                TerrainKind::Unset => panic!("cell left unset"),
            }
        }

        let total: usize = report.clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, report.water_cells);
    }

    #[test]
    fn test_clusters_are_connected() {
        let (grid, report) = generate(world(14, 45.0, 60.0), 21);
        let report = report.unwrap();

        for cluster in &report.clusters {
            let mut seen = HashSet::new();
            let mut queue = VecDeque::from([cluster.seed]);
            seen.insert(cluster.seed);
            while let Some(pos) = queue.pop_front() {
                for neighbor in grid.neighbors(pos) {
                    let same = grid.get(neighbor).and_then(|c| c.cluster_id) == Some(cluster.id);
                    if same && seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
            assert_eq!(seen.len(), cluster.size, "cluster {} is split", cluster.id);
        }
    }

    proptest! {
        #[test]
        fn prop_water_count_matches_target(
            side in 1usize..12,
            water in 0u32..=100,
            distribution in 1u32..=100,
            seed in any::<u64>(),
        ) {
            let config = world(side, f64::from(water), f64::from(distribution));
            let (grid, report) = generate(config, seed);
            let report = report.unwrap();

            prop_assert_eq!(grid.count(TerrainKind::Water), report.target_water_cells);
            prop_assert_eq!(report.water_cells + report.land_cells, grid.area());
            prop_assert_eq!(grid.count(TerrainKind::Unset), 0);
        }
    }
}

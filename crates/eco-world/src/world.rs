//! The generated world organisms live on.

use crate::grid::Grid;
use crate::terrain::{TerrainGenerator, TerrainReport};
use eco_core::{GenerationConfig, Result, WorldConfig};
use rand::Rng;

pub struct World {
    pub grid: Grid,
    /// Carried for a weather subsystem; generation does not read it
    pub rainfall_frequency: f64,
    pub report: TerrainReport,
}

impl World {
    pub fn generate(
        config: &WorldConfig,
        budget: &GenerationConfig,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let mut grid = Grid::new(config.side_length);
        let generator = TerrainGenerator::new(config.clone(), budget.clone());
        let report = generator.generate(&mut grid, rng)?;

        Ok(Self {
            grid,
            rainfall_frequency: config.rainfall_frequency,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::TerrainKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_world_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let config = WorldConfig {
            side_length: 10,
            water_percentage: 20.0,
            water_distribution: 50.0,
            rainfall_frequency: 3.5,
        };

        let world = World::generate(&config, &GenerationConfig::default(), &mut rng).unwrap();
        assert_eq!(world.grid.area(), 100);
        assert_eq!(world.grid.count(TerrainKind::Water), 20);
        assert_eq!(world.rainfall_frequency, 3.5);
    }
}

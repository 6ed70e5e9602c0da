//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{FoodType, TerrainKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Side length of the square world grid
    pub side_length: usize,
    /// Share of cells that must end up as water (0.0 to 100.0)
    pub water_percentage: f64,
    /// Cluster count vs. cluster size trade-off (1.0 to 100.0); low values
    /// favour fewer, larger lakes
    pub water_distribution: f64,
    /// Rainfall frequency, carried for a weather subsystem
    pub rainfall_frequency: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            side_length: 32,
            water_percentage: 30.0,
            water_distribution: 50.0,
            rainfall_frequency: 10.0,
        }
    }
}

impl WorldConfig {
    pub fn area(&self) -> usize {
        self.side_length * self.side_length
    }

    pub fn validate(&self) -> Result<()> {
        if !self.water_percentage.is_finite() || self.water_percentage < 0.0 {
            return Err(Error::Validation(format!(
                "water_percentage must be a non-negative number, got {}",
                self.water_percentage
            )));
        }
        if !self.water_distribution.is_finite() || self.water_distribution <= 0.0 {
            return Err(Error::Validation(format!(
                "water_distribution must be positive, got {}",
                self.water_distribution
            )));
        }
        if !self.rainfall_frequency.is_finite() || self.rainfall_frequency < 0.0 {
            return Err(Error::Validation(format!(
                "rainfall_frequency must be non-negative, got {}",
                self.rainfall_frequency
            )));
        }
        Ok(())
    }
}

/// Retry budgets for terrain generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seed draws allowed per pass, as a multiple of the grid area
    pub max_seed_attempts_per_cell: usize,
    /// Full regenerations allowed before giving up
    pub max_regenerations: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_seed_attempts_per_cell: 64,
            max_regenerations: 8,
        }
    }
}

/// Food and water handed to organisms each tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForagingConfig {
    /// Nutrition gained per tick from one food item
    pub food_per_tick: f64,
    /// Water gained per tick when on or next to water
    pub water_per_tick: f64,
}

impl Default for ForagingConfig {
    fn default() -> Self {
        Self {
            food_per_tick: 14.0,
            water_per_tick: 6.0,
        }
    }
}

/// Population rules that can change between runs without code changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicRules {
    /// Allow fertile organisms to reproduce
    pub allow_reproduction: bool,
    /// Fractional jitter applied to inherited adaptation traits (0.0 to 1.0)
    pub mutation_rate: f64,
    /// Maximum number of organisms alive at once
    pub max_population: usize,
}

impl Default for DynamicRules {
    fn default() -> Self {
        Self {
            allow_reproduction: true,
            mutation_rate: 0.05,
            max_population: 500,
        }
    }
}

/// Traits used to build one organism.
///
/// The first six fields are required. They are optional here so a missing
/// one can be reported by name instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimalConfig {
    pub species: Option<String>,
    pub parent: Option<String>,
    pub max_size: Option<f64>,
    pub min_food: Option<f64>,
    pub movement: Option<f64>,
    pub food_type: Option<FoodType>,
    pub subspecies: Option<u32>,
    pub generation: Option<u32>,
    pub preferred_terrain: Option<TerrainKind>,
    pub wing_size: Option<f64>,
    pub water_movement: Option<f64>,
    pub fin_development: Option<f64>,
    pub variation_baseline: Option<f64>,
}

impl AnimalConfig {
    pub fn new(
        species: impl Into<String>,
        parent: impl Into<String>,
        max_size: f64,
        min_food: f64,
        movement: f64,
        food_type: FoodType,
    ) -> Self {
        Self {
            species: Some(species.into()),
            parent: Some(parent.into()),
            max_size: Some(max_size),
            min_food: Some(min_food),
            movement: Some(movement),
            food_type: Some(food_type),
            ..Default::default()
        }
    }

    pub fn with_wing_size(mut self, wing_size: f64) -> Self {
        self.wing_size = Some(wing_size);
        self
    }

    pub fn with_water_movement(mut self, water_movement: f64) -> Self {
        self.water_movement = Some(water_movement);
        self
    }

    pub fn with_fin_development(mut self, fin_development: f64) -> Self {
        self.fin_development = Some(fin_development);
        self
    }

    pub fn with_variation_baseline(mut self, baseline: f64) -> Self {
        self.variation_baseline = Some(baseline);
        self
    }

    /// Fill in defaults and check that every required field is present.
    pub fn resolve(&self) -> Result<AnimalTraits> {
        Ok(AnimalTraits {
            species: required(&self.species, "species")?,
            parent: required(&self.parent, "parent")?,
            max_size: required(&self.max_size, "max_size")?,
            min_food: required(&self.min_food, "min_food")?,
            movement: required(&self.movement, "movement")?,
            food_type: required(&self.food_type, "food_type")?,
            subspecies: self.subspecies.unwrap_or(0),
            generation: self.generation.unwrap_or(1),
            preferred_terrain: self.preferred_terrain.unwrap_or(TerrainKind::Land),
            wing_size: self.wing_size.unwrap_or(1.0),
            water_movement: self.water_movement.unwrap_or(1.0),
            fin_development: self.fin_development.unwrap_or(1.0),
            variation_baseline: self.variation_baseline,
        })
    }
}

fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| Error::MissingParameter(name.to_string()))
}

/// A fully specified set of input traits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalTraits {
    pub species: String,
    pub parent: String,
    pub max_size: f64,
    pub min_food: f64,
    pub movement: f64,
    pub food_type: FoodType,
    pub subspecies: u32,
    pub generation: u32,
    pub preferred_terrain: TerrainKind,
    pub wing_size: f64,
    pub water_movement: f64,
    pub fin_development: f64,
    pub variation_baseline: Option<f64>,
}

impl From<&AnimalTraits> for AnimalConfig {
    fn from(traits: &AnimalTraits) -> Self {
        Self {
            species: Some(traits.species.clone()),
            parent: Some(traits.parent.clone()),
            max_size: Some(traits.max_size),
            min_food: Some(traits.min_food),
            movement: Some(traits.movement),
            food_type: Some(traits.food_type),
            subspecies: Some(traits.subspecies),
            generation: Some(traits.generation),
            preferred_terrain: Some(traits.preferred_terrain),
            wing_size: Some(traits.wing_size),
            water_movement: Some(traits.water_movement),
            fin_development: Some(traits.fin_development),
            variation_baseline: traits.variation_baseline,
        }
    }
}

/// A group of identical organisms placed at world creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSeed {
    pub count: usize,
    #[serde(flatten)]
    pub animal: AnimalConfig,
}

/// Simulation run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of ticks to run the simulation
    pub num_ticks: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    pub world: WorldConfig,
    pub generation: GenerationConfig,
    pub foraging: ForagingConfig,
    pub rules: DynamicRules,
    /// Initial population
    pub population: Vec<SpeciesSeed>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_ticks: 200,
            seed: 0,
            world: WorldConfig::default(),
            generation: GenerationConfig::default(),
            foraging: ForagingConfig::default(),
            rules: DynamicRules::default(),
            population: vec![
                SpeciesSeed {
                    count: 12,
                    animal: AnimalConfig::new("deer", "deer", 60.0, 8.0, 3.0, FoodType::Herbivore),
                },
                SpeciesSeed {
                    count: 6,
                    animal: AnimalConfig::new("otter", "otter", 30.0, 5.0, 2.0, FoodType::Omnivore)
                        .with_water_movement(12.0)
                        .with_fin_development(20.0),
                },
            ],
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading simulation config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.world.validate()?;
        if self.generation.max_seed_attempts_per_cell == 0 || self.generation.max_regenerations == 0 {
            return Err(Error::Validation(
                "generation budgets must allow at least one attempt".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rules.mutation_rate) {
            return Err(Error::Validation(format!(
                "mutation_rate must be within 0.0..=1.0, got {}",
                self.rules.mutation_rate
            )));
        }
        if self.foraging.food_per_tick < 0.0 || self.foraging.water_per_tick < 0.0 {
            return Err(Error::Validation(
                "foraging rations must be non-negative".to_string(),
            ));
        }
        for seed in &self.population {
            seed.animal.resolve()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let world_config = WorldConfig::default();
        assert_eq!(world_config.side_length, 32);
        assert_eq!(world_config.area(), 1024);

        let config = SimulationConfig::default();
        assert_eq!(config.num_ticks, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let mut animal = AnimalConfig::new("wolf", "wolf", 80.0, 10.0, 4.0, FoodType::Carnivore);
        animal.food_type = None;

        match animal.resolve() {
            Err(Error::MissingParameter(name)) => assert_eq!(name, "food_type"),
            other => panic!("expected MissingParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_fields_default() {
        let traits = AnimalConfig::new("wolf", "wolf", 80.0, 10.0, 4.0, FoodType::Carnivore)
            .resolve()
            .unwrap();
        assert_eq!(traits.subspecies, 0);
        assert_eq!(traits.generation, 1);
        assert_eq!(traits.wing_size, 1.0);
        assert_eq!(traits.water_movement, 1.0);
        assert_eq!(traits.fin_development, 1.0);
        assert_eq!(traits.variation_baseline, None);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "num_ticks": 10,
            "seed": 7,
            "world": { "side_length": 8, "water_percentage": 25.0,
                       "water_distribution": 40.0, "rainfall_frequency": 0.0 },
            "population": [
                { "count": 3, "species": "hare", "parent": "hare", "max_size": 20.0,
                  "min_food": 4.0, "movement": 5.0, "food_type": "herbivore" }
            ]
        }"#;

        let config = SimulationConfig::from_json_str(json).unwrap();
        assert_eq!(config.num_ticks, 10);
        assert_eq!(config.world.side_length, 8);
        assert_eq!(config.population.len(), 1);
        assert_eq!(config.population[0].count, 3);
        assert_eq!(config.population[0].animal.species.as_deref(), Some("hare"));
        assert_eq!(config.generation.max_regenerations, 8);
    }

    #[test]
    fn test_json_population_missing_field_is_reported() {
        let json = r#"{
            "population": [
                { "count": 1, "species": "hare", "parent": "hare", "max_size": 20.0,
                  "movement": 5.0, "food_type": "herbivore" }
            ]
        }"#;

        assert!(matches!(
            SimulationConfig::from_json_str(json),
            Err(Error::MissingParameter(name)) if name == "min_food"
        ));
    }

    #[test]
    fn test_invalid_distribution_rejected() {
        let world = WorldConfig {
            water_distribution: 0.0,
            ..Default::default()
        };
        assert!(matches!(world.validate(), Err(Error::Validation(_))));
    }
}

//! Simulation engine: steps a population of organisms over a generated world.

use crate::grid::Grid;
use crate::organism::{Organism, OrganismData};
use crate::species::{census, SpeciesRecord, SpeciesRegistry, SpeciesStats};
use crate::terrain::TerrainReport;
use crate::world::World;
use eco_core::{
    AnimalConfig, Error, FoodItem, ForagingConfig, OrganismId, Position, Result, SimulationConfig,
    TerrainKind,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, trace};

const SPAWN_ATTEMPTS: usize = 100;
const METRICS_INTERVAL: u64 = 100;

pub struct Simulation {
    world: World,
    organisms: BTreeMap<OrganismId, Organism>,
    registry: SpeciesRegistry,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    tick: u64,
    births: u64,
    deaths: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let world = World::generate(&config.world, &config.generation, &mut rng)?;
        let population = config.population.clone();

        let mut sim = Self {
            world,
            organisms: BTreeMap::new(),
            registry: SpeciesRegistry::new(),
            config,
            rng,
            tick: 0,
            births: 0,
            deaths: 0,
        };

        // Spawn initial organisms
        for seed in &population {
            for _ in 0..seed.count {
                sim.spawn_organism(&seed.animal)?;
            }
        }
        info!(
            population = sim.organisms.len(),
            species = sim.registry.len(),
            "Initial population spawned"
        );

        Ok(sim)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn organisms(&self) -> impl Iterator<Item = &Organism> + '_ {
        self.organisms.values()
    }

    pub fn population(&self) -> usize {
        self.organisms.len()
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    /// Ticks completed so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run the simulation for the configured number of ticks
    #[instrument(skip(self), fields(num_ticks = self.config.num_ticks))]
    pub fn run(&mut self) -> Result<SimulationResult> {
        info!("Starting simulation for {} ticks", self.config.num_ticks);

        while self.tick < self.config.num_ticks {
            self.step()?;

            if self.organisms.is_empty() {
                info!(tick = self.tick, "Population extinct, stopping early");
                break;
            }
            if self.tick % METRICS_INTERVAL == 0 {
                self.emit_population_metrics();
            }
        }

        let result = self.collect_results();
        info!(
            event = "run_summary",
            total_ticks = result.total_ticks,
            survivors = result.survivors.len(),
            births = result.births,
            deaths = result.deaths,
            species_seen = result.species.len(),
            "Simulation complete"
        );
        Ok(result)
    }

    /// Execute one simulation tick
    pub fn step(&mut self) -> Result<()> {
        // Shuffle for fairness
        let mut ids: Vec<OrganismId> = self.organisms.keys().copied().collect();
        ids.shuffle(&mut self.rng);

        for id in ids {
            self.process_organism(id)?;
        }

        self.remove_dead_organisms();
        self.tick += 1;
        Ok(())
    }

    fn process_organism(&mut self, id: OrganismId) -> Result<()> {
        let population = self.organisms.len();
        let Some(organism) = self.organisms.get_mut(&id) else {
            return Ok(());
        };

        forage(organism, &self.world.grid, &self.config.foraging, &mut self.rng);
        let stage = organism.advance_tick();
        organism.metabolize();
        trace!(organism_id = %id, ?stage, health = organism.health, size = organism.size, "Organism ticked");

        let rules = &self.config.rules;
        if !rules.allow_reproduction || !organism.is_fertile || population >= rules.max_population {
            return Ok(());
        }

        if let Some(mut offspring) = organism.breed(rules.mutation_rate, &mut self.rng)? {
            info!(
                event = "birth",
                parent_id = %id,
                offspring_id = %offspring.id,
                species = %offspring.species,
                generation = offspring.generation,
                tick = self.tick,
                "Organism reproduced"
            );
            self.registry.register(&mut offspring, self.tick);
            self.organisms.insert(offspring.id, offspring);
            self.births += 1;
        }

        Ok(())
    }

    fn remove_dead_organisms(&mut self) {
        let dead: Vec<OrganismId> = self
            .organisms
            .iter()
            .filter(|(_, org)| !org.is_alive())
            .map(|(id, _)| *id)
            .collect();

        for id in dead {
            if let Some(organism) = self.organisms.remove(&id) {
                debug!(
                    event = "organism_death",
                    organism_id = %id,
                    species = %organism.species,
                    tick = self.tick,
                    age = organism.age,
                    lifespan = organism.lifespan,
                    size = organism.size,
                    offspring_count = organism.offspring_count,
                    "Organism died"
                );
                self.deaths += 1;
            }
        }
    }

    fn spawn_organism(&mut self, animal: &AnimalConfig) -> Result<()> {
        let mut organism = Organism::new(Position::new(0, 0), animal, &mut self.rng)?;
        let area = self.world.grid.area();

        for _ in 0..SPAWN_ATTEMPTS {
            let pos = self.world.grid.index_to_pos(self.rng.gen_range(0..area));
            if self.world.grid.terrain_at(pos) == Some(organism.preferred_terrain) {
                organism.move_to(pos);
                self.registry.register(&mut organism, self.tick);
                self.organisms.insert(organism.id, organism);
                return Ok(());
            }
        }

        Err(Error::ResourceExhausted(format!(
            "no {} cell found to spawn {}",
            organism.preferred_terrain, organism.species
        )))
    }

    fn emit_population_metrics(&self) {
        let total = self.organisms.len();
        let avg_size = if total > 0 {
            self.organisms.values().map(|o| o.size).sum::<f64>() / total as f64
        } else {
            0.0
        };
        let fertile = self.organisms.values().filter(|o| o.is_fertile).count();

        info!(
            event = "population_metrics",
            tick = self.tick,
            total_population = total,
            avg_size,
            fertile,
            births = self.births,
            deaths = self.deaths,
            species_seen = self.registry.len(),
            "Population metrics snapshot"
        );
    }

    fn collect_results(&self) -> SimulationResult {
        SimulationResult {
            total_ticks: self.tick,
            terrain: self.world.report.clone(),
            survivors: self.organisms.values().map(OrganismData::from).collect(),
            births: self.births,
            deaths: self.deaths,
            species: self.registry.records().cloned().collect(),
            census: census(self.organisms.values()),
        }
    }
}

/// Feed and water one organism for the coming tick. Thirsty organisms walk
/// toward the nearest water first.
fn forage(organism: &mut Organism, grid: &Grid, foraging: &ForagingConfig, rng: &mut ChaCha8Rng) {
    if !organism.is_alive() {
        return;
    }

    if organism.thirst > 0.0 && !near_water(grid, organism.location) {
        seek_water(organism, grid);
    }

    let item = match &organism.acquired_taste {
        Some(taste) if rng.gen_bool(0.5) => Some(taste.clone()),
        _ => organism
            .food_type
            .menu()
            .choose(rng)
            .map(|name| FoodItem::new(*name)),
    };
    if let Some(item) = item {
        organism.eat(item, foraging.food_per_tick);
    }

    if near_water(grid, organism.location) {
        organism.drink(foraging.water_per_tick);
    }
}

fn near_water(grid: &Grid, pos: Position) -> bool {
    grid.terrain_at(pos) == Some(TerrainKind::Water) || grid.has_adjacent(pos, TerrainKind::Water)
}

fn seek_water(organism: &mut Organism, grid: &Grid) {
    let Some(target) = grid.nearest(organism.location, TerrainKind::Water) else {
        return;
    };

    let steps = organism.movement.floor().max(1.0) as usize;
    for _ in 0..steps {
        if near_water(grid, organism.location) {
            break;
        }
        let next = step_toward(organism.location, target);
        organism.move_to(next);
    }
}

fn step_toward(from: Position, to: Position) -> Position {
    let dx = (to.x - from.x).signum();
    if dx != 0 {
        from.add(dx, 0)
    } else {
        from.add(0, (to.y - from.y).signum())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationResult {
    pub total_ticks: u64,
    pub terrain: TerrainReport,
    pub survivors: Vec<OrganismData>,
    pub births: u64,
    pub deaths: u64,
    pub species: Vec<SpeciesRecord>,
    pub census: BTreeMap<String, SpeciesStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::{FoodType, SpeciesSeed, WorldConfig};

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            num_ticks: 40,
            seed,
            world: WorldConfig {
                side_length: 12,
                water_percentage: 25.0,
                water_distribution: 50.0,
                rainfall_frequency: 1.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(small_config(42)).unwrap();

        assert_eq!(sim.population(), 18);
        assert_eq!(sim.world().grid.count(TerrainKind::Water), 36);
        for organism in sim.organisms() {
            assert_eq!(
                sim.world().grid.terrain_at(organism.location),
                Some(organism.preferred_terrain)
            );
            assert!(organism.saved);
        }
        assert!(sim.registry().get("deer").is_some());
        assert!(sim.registry().get("otter").is_some());
    }

    #[test]
    fn test_runs_are_reproducible() {
        let a = Simulation::new(small_config(7)).unwrap().run().unwrap();
        let b = Simulation::new(small_config(7)).unwrap().run().unwrap();

        assert_eq!(a.total_ticks, b.total_ticks);
        assert_eq!(a.births, b.births);
        assert_eq!(a.deaths, b.deaths);
        let ids_a: Vec<_> = a.survivors.iter().map(|o| o.id).collect();
        let ids_b: Vec<_> = b.survivors.iter().map(|o| o.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_step_removes_the_dead() {
        let mut sim = Simulation::new(small_config(3)).unwrap();
        for _ in 0..30 {
            sim.step().unwrap();
            assert!(sim.organisms().all(|o| o.is_alive()));
            assert!(sim.organisms().all(|o| sim.world().grid.contains(o.location)));
        }
        assert_eq!(sim.tick(), 30);
    }

    #[test]
    fn test_starving_population_dies_out() {
        let mut config = small_config(5);
        config.num_ticks = 100;
        config.foraging.food_per_tick = 0.0;

        let mut sim = Simulation::new(config).unwrap();
        let initial = sim.population() as u64;
        let result = sim.run().unwrap();

        assert!(result.survivors.is_empty());
        assert_eq!(result.deaths, initial);
        assert_eq!(result.births, 0);
        assert!(result.total_ticks < 100);
    }

    #[test]
    fn test_population_cap_is_respected() {
        let mut config = small_config(11);
        config.num_ticks = 120;
        config.rules.max_population = 20;

        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..120 {
            sim.step().unwrap();
            assert!(sim.population() <= 20);
        }
    }

    #[test]
    fn test_unsatisfiable_world_is_reported() {
        let mut config = small_config(1);
        config.world.water_percentage = 150.0;

        assert!(matches!(
            Simulation::new(config),
            Err(Error::GenerationUnsatisfiable(_))
        ));
    }

    #[test]
    fn test_spawn_without_habitat_fails() {
        let mut config = small_config(1);
        config.world.water_percentage = 100.0;
        config.population = vec![SpeciesSeed {
            count: 1,
            animal: AnimalConfig::new("mole", "mole", 10.0, 2.0, 1.0, FoodType::Herbivore),
        }];

        assert!(matches!(
            Simulation::new(config),
            Err(Error::ResourceExhausted(_))
        ));
    }

    #[test]
    fn test_thirsty_organism_walks_to_water() {
        let mut grid = Grid::new(8);
        let positions: Vec<Position> = grid.positions().collect();
        for pos in positions {
            let kind = if pos == Position::new(7, 7) {
                TerrainKind::Water
            } else {
                TerrainKind::Land
            };
            grid.get_mut(pos).unwrap().set_terrain(kind, 0);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let config = AnimalConfig::new("deer", "deer", 60.0, 8.0, 3.0, FoodType::Herbivore);
        let mut deer = Organism::new(Position::new(0, 7), &config, &mut rng).unwrap();
        deer.thirst = 2.0;

        seek_water(&mut deer, &grid);
        assert_eq!(deer.location, Position::new(3, 7));

        seek_water(&mut deer, &grid);
        assert_eq!(deer.location, Position::new(6, 7));
        assert!(near_water(&grid, deer.location));
    }

    #[test]
    fn test_result_serialization() {
        let mut config = small_config(2);
        config.num_ticks = 5;
        let result = Simulation::new(config).unwrap().run().unwrap();

        let json = serde_json::to_string(&result).unwrap();
        let parsed: SimulationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_ticks, result.total_ticks);
        assert_eq!(parsed.survivors.len(), result.survivors.len());
    }
}

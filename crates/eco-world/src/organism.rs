//! Organism state and lifecycle.

use crate::lifecycle::{LifeStage, NourishmentGuard, VitalityGuard, GROWTH_HEALING, MAX_HEALTH};
use eco_core::{
    AnimalConfig, AnimalTraits, Error, FoodItem, FoodType, OrganismId, Position, Result, Sex,
    TerrainKind,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

const INITIAL_SIZE: f64 = 1.0;
const INITIAL_DECAY_TIME: u32 = 1;
const DECAY_TOLERANCE: u32 = 5;
/// Items kept in the stomach history
pub const STOMACH_CAPACITY: usize = 10;
/// Stomach items needed before a taste can be acquired
const TASTE_THRESHOLD: usize = 5;
const VARIANT_MARKER: &str = "-variant";

/// An organism renamed because its traits drifted away from its species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciationEvent {
    pub previous_species: String,
    pub species: String,
    pub parent_species: String,
    pub subspecies: u32,
}

/// An animal in the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub location: Position,

    pub species: String,
    pub parent_species: String,
    pub subspecies: u32,
    pub generation: u32,

    // Fixed at creation
    pub max_size: f64,
    pub min_food: f64,
    pub growth_rate: f64,
    pub lifespan: u32,
    pub maturity_age: u32,
    pub offspring_max: u32,
    pub min_water: f64,
    pub sex: Sex,
    pub movement: f64,
    pub food_type: FoodType,

    pub age: u32,
    pub size: f64,
    pub health: i32,
    pub consumable_meat: f64,
    pub decay_time: u32,
    pub offspring_count: u32,
    pub is_fertile: bool,
    pub water_level: f64,
    pub thirst: f64,
    pub food_level: f64,
    pub decay_tolerance: u32,
    pub stomach: VecDeque<FoodItem>,
    pub acquired_taste: Option<FoodItem>,
    pub stage: LifeStage,

    pub preferred_terrain: TerrainKind,
    pub can_fly: bool,
    pub wing_size: f64,
    pub water_movement: f64,
    pub fin_development: f64,
    pub variation: f64,
    pub variation_baseline: f64,

    /// Cleared when the species changes so the registry can record it
    pub saved: bool,
    heritage: AnimalTraits,
}

impl Organism {
    pub fn new(location: Position, config: &AnimalConfig, rng: &mut impl Rng) -> Result<Self> {
        let traits = config.resolve()?;
        if !traits.max_size.is_finite() || traits.max_size <= 0.0 {
            return Err(Error::Validation(format!(
                "max_size must be positive, got {}",
                traits.max_size
            )));
        }

        let id = OrganismId::from_rng(rng);
        let min_food = traits.min_food + traits.max_size / 50.0;
        let growth_rate = traits.max_size / min_food;
        let lifespan = roll_lifespan(traits.max_size, growth_rate, rng);
        let sex = Sex::random(rng);

        let mut movement = traits.movement;
        let mut can_fly = false;
        if traits.wing_size >= 5.0 {
            movement *= 1.2;
        }
        if traits.wing_size >= 25.0 {
            movement *= 1.8;
            can_fly = true;
        }

        let mut water_movement = traits.water_movement;
        if traits.fin_development >= 20.0 {
            water_movement *= 1.8;
        }

        // The variation score weighs fins where the baseline weighs wings.
        let variation = 2.0 * traits.fin_development + min_food + traits.max_size + water_movement;
        let variation_baseline = traits.variation_baseline.unwrap_or(
            traits.wing_size + min_food + traits.max_size + water_movement + traits.fin_development,
        );

        let size = INITIAL_SIZE.min(traits.max_size);
        let mut organism = Self {
            id,
            location,
            species: traits.species.clone(),
            parent_species: traits.parent.clone(),
            subspecies: traits.subspecies,
            generation: traits.generation,
            max_size: traits.max_size,
            min_food,
            growth_rate,
            lifespan,
            maturity_age: (lifespan as f64 * 0.7).ceil() as u32,
            offspring_max: (lifespan as f64 / 4.0).ceil() as u32,
            min_water: (min_food / 3.0).ceil(),
            sex,
            movement,
            food_type: traits.food_type,
            age: 0,
            size,
            health: MAX_HEALTH,
            consumable_meat: size,
            decay_time: INITIAL_DECAY_TIME,
            offspring_count: 0,
            is_fertile: false,
            water_level: 0.0,
            thirst: 0.0,
            food_level: 0.0,
            decay_tolerance: DECAY_TOLERANCE,
            stomach: VecDeque::with_capacity(STOMACH_CAPACITY),
            acquired_taste: None,
            stage: LifeStage::Juvenile,
            preferred_terrain: traits.preferred_terrain,
            can_fly,
            wing_size: traits.wing_size,
            water_movement,
            fin_development: traits.fin_development,
            variation,
            variation_baseline,
            saved: true,
            heritage: traits,
        };
        organism.classify_organism();

        Ok(organism)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Advance one tick of the lifecycle and report the resulting stage.
    ///
    /// Dead organisms stay dead: nothing changes once health reached zero.
    pub fn advance_tick(&mut self) -> LifeStage {
        if self.stage.is_terminal() || !self.is_alive() {
            self.stage = LifeStage::Dead;
            return self.stage;
        }

        self.age += 1;
        self.analyze_stomach();

        let nourishment = NourishmentGuard::select(self);
        if let Some(guard) = nourishment {
            guard.apply(self);
        }

        let vitality = if self.is_alive() {
            VitalityGuard::select(self)
        } else {
            None
        };
        if let Some(guard) = vitality {
            guard.apply(self);
        }

        self.health = self.health.clamp(0, MAX_HEALTH);
        self.stage = LifeStage::after_tick(self, nourishment, vitality);
        self.stage
    }

    /// Grow by one step and heal
    pub fn grow(&mut self) {
        // A non-positive effective min_food makes growth_rate negative or infinite.
        self.size = round_cents(self.size + self.growth_rate).clamp(0.0, self.max_size);
        self.health = (self.health + GROWTH_HEALING).min(MAX_HEALTH);
        self.decay_time = (self.size / 10.0).ceil() as u32;
        self.consumable_meat = self.size;
    }

    /// Pick up the most frequent stomach item as the acquired taste once
    /// the stomach holds enough history. Ties go to the item seen first.
    pub fn analyze_stomach(&mut self) {
        if self.stomach.len() <= TASTE_THRESHOLD {
            return;
        }

        let mut favourite: Option<(&FoodItem, usize)> = None;
        for item in &self.stomach {
            let frequency = self.stomach.iter().filter(|other| *other == item).count();
            if favourite.map_or(true, |(_, best)| frequency > best) {
                favourite = Some((item, frequency));
            }
        }
        self.acquired_taste = favourite.map(|(item, _)| item.clone());
    }

    /// Derive preferred terrain and detect a speciation event.
    ///
    /// A rename rebases the variation baseline onto the current variation,
    /// so calling this again with unchanged traits does nothing.
    pub fn classify_organism(&mut self) -> Option<SpeciationEvent> {
        self.preferred_terrain = if self.water_movement > 10.0 {
            TerrainKind::Water
        } else {
            TerrainKind::Land
        };

        let threshold = 10.0 * self.max_size / 15.0;
        if (self.variation - self.variation_baseline).abs() <= threshold {
            return None;
        }

        let parent_species = base_species(&self.species).to_string();
        self.subspecies += 1;
        let species = format!("{}{}{}", parent_species, VARIANT_MARKER, self.subspecies);
        let previous_species = std::mem::replace(&mut self.species, species);
        self.parent_species = parent_species;
        self.variation_baseline = self.variation;
        self.saved = false;

        info!(
            event = "speciation",
            organism_id = %self.id,
            previous_species = %previous_species,
            species = %self.species,
            subspecies = self.subspecies,
            "New variant detected"
        );

        Some(SpeciationEvent {
            previous_species,
            species: self.species.clone(),
            parent_species: self.parent_species.clone(),
            subspecies: self.subspecies,
        })
    }

    pub fn eat(&mut self, item: FoodItem, nutrition: f64) {
        if self.stomach.len() == STOMACH_CAPACITY {
            self.stomach.pop_front();
        }
        self.stomach.push_back(item);
        self.food_level += nutrition;
    }

    pub fn drink(&mut self, amount: f64) {
        self.water_level += amount;
    }

    /// Burn one tick's worth of food and water. A water shortfall becomes
    /// thirst for the next tick.
    pub fn metabolize(&mut self) {
        if !self.is_alive() {
            return;
        }

        self.food_level = (self.food_level - self.min_food).max(0.0);
        let shortfall = self.min_water - self.water_level;
        if shortfall > 0.0 {
            self.water_level = 0.0;
            self.thirst = shortfall;
        } else {
            self.water_level -= self.min_water;
            self.thirst = 0.0;
        }
    }

    pub fn move_to(&mut self, new_location: Position) {
        self.location = new_location;
    }

    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Produce one offspring if fertile. Adaptation traits are jittered by
    /// up to `mutation_rate` as a fraction of the parent's value.
    pub fn breed(&mut self, mutation_rate: f64, rng: &mut impl Rng) -> Result<Option<Organism>> {
        if !self.is_alive() || !self.is_fertile {
            return Ok(None);
        }

        let mut config = AnimalConfig::from(&self.heritage);
        config.species = Some(self.species.clone());
        config.parent = Some(self.parent_species.clone());
        config.subspecies = Some(self.subspecies);
        config.generation = Some(self.generation + 1);
        config.variation_baseline = Some(self.variation_baseline);
        config.wing_size = Some(mutate(self.heritage.wing_size, mutation_rate, rng));
        config.water_movement = Some(mutate(self.heritage.water_movement, mutation_rate, rng));
        config.fin_development = Some(mutate(self.heritage.fin_development, mutation_rate, rng));

        let offspring = Organism::new(self.location, &config, rng)?;

        self.offspring_count += 1;
        if self.offspring_count >= self.offspring_max {
            self.is_fertile = false;
        }

        Ok(Some(offspring))
    }
}

fn roll_lifespan(max_size: f64, growth_rate: f64, rng: &mut impl Rng) -> u32 {
    // Twice the time it takes to reach full size, give or take 10%.
    let base = (max_size / growth_rate) * 2.0;
    if !base.is_finite() || base <= 0.0 {
        return 1;
    }
    let low = (base * 0.9).floor() as u32;
    let high = (base * 1.1).ceil() as u32;
    rng.gen_range(low..=high).max(1)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mutate(value: f64, rate: f64, rng: &mut impl Rng) -> f64 {
    if rate <= 0.0 {
        return value;
    }
    value * (1.0 + rng.gen_range(-rate..=rate))
}

/// Species name without any variant suffix
fn base_species(species: &str) -> &str {
    species
        .split_once(VARIANT_MARKER)
        .map_or(species, |(base, _)| base)
}

/// Serializable organism summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismData {
    pub id: OrganismId,
    pub species: String,
    pub parent_species: String,
    pub generation: u32,
    pub location: Position,
    pub age: u32,
    pub size: f64,
    pub health: i32,
    pub stage: LifeStage,
    pub offspring_count: u32,
}

impl From<&Organism> for OrganismData {
    fn from(org: &Organism) -> Self {
        Self {
            id: org.id,
            species: org.species.clone(),
            parent_species: org.parent_species.clone(),
            generation: org.generation,
            location: org.location,
            age: org.age,
            size: org.size,
            health: org.health,
            stage: org.stage,
            offspring_count: org.offspring_count,
        }
    }
}

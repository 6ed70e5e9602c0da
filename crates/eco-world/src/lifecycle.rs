//! Per-tick lifecycle rules for organisms.
//!
//! A tick evaluates two ordered guard lists. The first matching
//! [`NourishmentGuard`] decides whether the organism grows or dehydrates;
//! then, if it is still alive, the first matching [`VitalityGuard`] decides
//! between natural death, starvation and the fertility check. Precedence
//! is the order of the `ORDER` arrays.

use crate::organism::Organism;
use serde::{Deserialize, Serialize};

pub const MAX_HEALTH: i32 = 100;
pub const DEHYDRATION_PENALTY: i32 = 20;
pub const STARVATION_PENALTY: i32 = 10;
pub const GROWTH_HEALING: i32 = 10;

/// Observable state of an organism after its latest tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    /// Never ticked; every tick reports one of the other stages
    #[default]
    Juvenile,
    Growing,
    MatureFertile,
    MatureInfertile,
    Dehydrated,
    Starving,
    Dead,
}

impl LifeStage {
    pub fn is_terminal(&self) -> bool {
        *self == LifeStage::Dead
    }

    /// Stage reported for a tick in which the given guards fired
    pub fn after_tick(
        organism: &Organism,
        nourishment: Option<NourishmentGuard>,
        vitality: Option<VitalityGuard>,
    ) -> Self {
        if !organism.is_alive() {
            return LifeStage::Dead;
        }
        match (nourishment, vitality) {
            (Some(NourishmentGuard::Dehydrated), _) => LifeStage::Dehydrated,
            (_, Some(VitalityGuard::Starving)) => LifeStage::Starving,
            (_, Some(VitalityGuard::Mature)) if organism.is_fertile => LifeStage::MatureFertile,
            (_, Some(VitalityGuard::Mature)) => LifeStage::MatureInfertile,
            (Some(NourishmentGuard::Sated), _) => LifeStage::Growing,
            // Unreachable for a living organism: food_level either reaches
            // min_food (Sated or Dehydrated) or falls short (Starving).
            _ => organism.stage,
        }
    }
}

/// Food and water checks, evaluated in `ORDER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NourishmentGuard {
    /// Enough food and no thirst: the organism grows
    Sated,
    /// Thirsty: the organism loses health
    Dehydrated,
}

impl NourishmentGuard {
    pub const ORDER: [NourishmentGuard; 2] = [NourishmentGuard::Sated, NourishmentGuard::Dehydrated];

    pub fn applies(&self, organism: &Organism) -> bool {
        match self {
            NourishmentGuard::Sated => {
                organism.food_level >= organism.min_food && organism.thirst <= 0.0
            }
            NourishmentGuard::Dehydrated => organism.thirst > 0.0,
        }
    }

    pub fn apply(&self, organism: &mut Organism) {
        match self {
            NourishmentGuard::Sated => {
                organism.thirst = 0.0;
                organism.grow();
            }
            NourishmentGuard::Dehydrated => organism.health -= DEHYDRATION_PENALTY,
        }
    }

    /// First guard in `ORDER` that applies
    pub fn select(organism: &Organism) -> Option<Self> {
        Self::ORDER.into_iter().find(|guard| guard.applies(organism))
    }
}

/// Age, hunger and maturity checks, evaluated in `ORDER` for living organisms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalityGuard {
    /// Lifespan reached
    Expired,
    /// Not enough food this tick
    Starving,
    /// Fully grown, fully healthy and old enough to breed
    Mature,
}

impl VitalityGuard {
    pub const ORDER: [VitalityGuard; 3] = [
        VitalityGuard::Expired,
        VitalityGuard::Starving,
        VitalityGuard::Mature,
    ];

    pub fn applies(&self, organism: &Organism) -> bool {
        match self {
            VitalityGuard::Expired => organism.age >= organism.lifespan,
            VitalityGuard::Starving => organism.food_level < organism.min_food,
            VitalityGuard::Mature => {
                organism.size == organism.max_size
                    && organism.health == MAX_HEALTH
                    && organism.age >= organism.maturity_age
            }
        }
    }

    pub fn apply(&self, organism: &mut Organism) {
        match self {
            VitalityGuard::Expired => organism.health = 0,
            VitalityGuard::Starving => {
                organism.health -= STARVATION_PENALTY;
                if organism.food_level < 0.0 {
                    organism.food_level = 0.0;
                }
            }
            VitalityGuard::Mature => {
                organism.is_fertile = organism.offspring_count < organism.offspring_max;
            }
        }
    }

    pub fn select(organism: &Organism) -> Option<Self> {
        Self::ORDER.into_iter().find(|guard| guard.applies(organism))
    }
}

//! Species bookkeeping: which species have been seen, and how each one is
//! doing.

use crate::organism::Organism;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// First sighting of a species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub name: String,
    pub parent: String,
    pub first_seen_tick: u64,
    pub generation: u32,
}

/// Known species, keyed by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    species: BTreeMap<String, SpeciesRecord>,
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the organism's species if it is new and mark the organism
    /// saved. Returns true when a new species was recorded.
    pub fn register(&mut self, organism: &mut Organism, tick: u64) -> bool {
        let is_new = !self.species.contains_key(&organism.species);
        if is_new {
            debug!(
                species = %organism.species,
                parent = %organism.parent_species,
                tick,
                "Species registered"
            );
            self.species.insert(
                organism.species.clone(),
                SpeciesRecord {
                    name: organism.species.clone(),
                    parent: organism.parent_species.clone(),
                    first_seen_tick: tick,
                    generation: organism.generation,
                },
            );
        }
        organism.mark_saved();
        is_new
    }

    pub fn get(&self, name: &str) -> Option<&SpeciesRecord> {
        self.species.get(name)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &SpeciesRecord> + '_ {
        self.species.values()
    }
}

/// Population statistics for one species
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStats {
    pub population: u32,
    pub avg_size: f64,
    pub avg_age: f64,
    pub fertile: u32,
}

impl SpeciesStats {
    /// Fold one organism into the running averages
    pub fn update(&mut self, organism: &Organism) {
        let n = self.population as f64;
        let new_n = n + 1.0;

        self.avg_size = (self.avg_size * n + organism.size) / new_n;
        self.avg_age = (self.avg_age * n + organism.age as f64) / new_n;
        if organism.is_fertile {
            self.fertile += 1;
        }
        self.population += 1;
    }
}

/// Per-species statistics for the living organisms
pub fn census<'a>(organisms: impl IntoIterator<Item = &'a Organism>) -> BTreeMap<String, SpeciesStats> {
    let mut stats: BTreeMap<String, SpeciesStats> = BTreeMap::new();
    for organism in organisms.into_iter().filter(|o| o.is_alive()) {
        stats
            .entry(organism.species.clone())
            .or_default()
            .update(organism);
    }
    stats
}

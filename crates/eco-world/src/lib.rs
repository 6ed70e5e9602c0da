//! World simulation engine.
//!
//! Terrain generation for the square grid organisms live on, the organism
//! lifecycle, and the tick loop that drives both.

pub mod grid;
pub mod lifecycle;
pub mod organism;
pub mod simulation;
pub mod species;
pub mod terrain;
pub mod world;

pub use grid::Grid;
pub use lifecycle::LifeStage;
pub use organism::{Organism, OrganismData, SpeciationEvent};
pub use simulation::{Simulation, SimulationResult};
pub use species::{SpeciesRecord, SpeciesRegistry, SpeciesStats};
pub use terrain::{ClusterSummary, TerrainGenerator, TerrainReport};
pub use world::World;

pub mod biome;
pub mod simulation;

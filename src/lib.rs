pub mod cli;
pub mod config;
pub mod game;
pub mod scene;
pub mod server;
pub mod statistics;
pub mod steering;
pub mod world;

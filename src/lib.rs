pub mod combat;
pub mod constants;
pub mod engine;
pub mod entities;
pub mod error;
pub mod factory;
pub mod grid;
pub mod items;
pub mod render;
pub mod rng;
pub mod save_store;
pub mod town;
pub mod types;

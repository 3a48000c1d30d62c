pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use models::{GameConfig, GameResult, Role, Seat};
pub use services::{play, EngineError, GameReport, GameSetup};

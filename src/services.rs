pub mod consensus;
pub mod error;
pub mod game_service;
pub mod judgement;
pub mod participant;
pub mod rendezvous;
pub mod setup;
pub mod strategy;
pub mod tally;

pub use consensus::*;
pub use error::*;
pub use game_service::*;
pub use judgement::*;
pub use participant::*;
pub use rendezvous::*;
pub use setup::*;
pub use strategy::*;
pub use tally::*;

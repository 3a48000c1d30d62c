pub mod cli;
pub mod config;
pub mod game;
pub mod narration;
pub mod player;
pub mod role;
pub mod rule;

pub use cli::*;
pub use config::*;
pub use game::*;
pub use narration::*;
pub use player::*;
pub use role::*;
pub use rule::*;

#![doc = "Common types shared across the clock-check workspace."]

pub mod clock;
pub mod config;
pub mod error;
pub mod state;
pub mod verdict;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use state::*;
pub use verdict::*;

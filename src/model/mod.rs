pub mod board;
pub mod config;
pub mod draft;
pub mod idea;

pub use board::*;
pub use config::*;
pub use draft::*;
pub use idea::*;

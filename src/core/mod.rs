pub mod config;
pub mod errors;
pub mod kernel;
pub mod normalized;
pub mod shorthand;
pub mod traits;
pub mod types;

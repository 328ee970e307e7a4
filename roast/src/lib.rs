pub mod args;
pub mod calltree;
pub mod config;
pub mod render;
pub mod sampler;
pub mod snapshot;
pub mod symbolication;

pub use calltree::{CallTree, SharedCallTree};
pub use sampler::Sampler;
pub use symbolication::Symbols;

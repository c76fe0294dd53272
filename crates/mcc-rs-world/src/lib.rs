//! World model: the flat block grid, classic block ids, custom block
//! definitions and the flat generator.

pub mod block;
pub mod definition;
pub mod error;
pub mod flat_generator;
pub mod world;

pub use block::ClientBlocks;
pub use definition::{BlockDefinition, BlockDefinitions};
pub use error::WorldError;
pub use world::{Dimensions, World};

//! Domain models for the herbal prescription engine.

mod analysis;
mod herb;
mod patient;
mod roles;
mod safety;

pub use analysis::*;
pub use herb::*;
pub use patient::*;
pub use roles::*;
pub use safety::*;

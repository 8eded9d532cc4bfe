mod engine;
mod registry;

pub use engine::*;
pub use registry::*;

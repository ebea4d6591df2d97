mod generator;
mod memory;
mod repository;
mod scope;

pub use generator::*;
pub use memory::*;
pub use repository::*;
pub use scope::*;

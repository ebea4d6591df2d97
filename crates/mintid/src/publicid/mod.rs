mod codec;
mod crc8;
mod error;
mod resource;

pub use codec::*;
pub use error::*;
pub use resource::*;

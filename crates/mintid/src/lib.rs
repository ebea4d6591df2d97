mod base32;
mod config;
mod error;
mod generator;
mod id;
mod publicid;
mod rand;
mod segment;
mod service;
mod time;

pub use crate::base32::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::publicid::*;
pub use crate::rand::*;
pub use crate::segment::*;
pub use crate::service::*;
pub use crate::time::*;

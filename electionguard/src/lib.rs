#[macro_use]
extern crate serde;

mod ballot;
mod chaum_pedersen;
mod decrypt;
mod dlog;
mod election;
mod elgamal;
mod encrypt;
mod error;
mod group;
mod hash;
mod manifest;
mod nonces;
mod serde_hex;

pub use ballot::*;
pub use chaum_pedersen::*;
pub use decrypt::*;
pub use dlog::*;
pub use election::*;
pub use elgamal::*;
pub use encrypt::*;
pub use error::*;
pub use group::*;
pub use hash::*;
pub use manifest::*;
pub use nonces::*;
pub use serde_hex::*;

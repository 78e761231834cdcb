//! Core types for the Warp prompt-to-transaction pipeline
//!
//! A [`Warp`] is a versioned document describing one or more chain actions.
//! It is compiled from a catalog template, assembled into an
//! [`UnsignedTransaction`], and signed exactly once into a
//! [`SignedTransaction`].

pub mod address;
pub mod alias;
pub mod data_type;
pub mod error;
pub mod intent;
pub mod payment;
pub mod transaction;
pub mod warp;

pub use address::*;
pub use alias::*;
pub use data_type::*;
pub use error::*;
pub use intent::*;
pub use payment::*;
pub use transaction::*;
pub use warp::*;

pub const PROTOCOL_VERSION: &str = "warp:0.5.0";

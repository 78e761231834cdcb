//! Transaction assembler
//!
//! Resolves input positions of a compiled Warp into the value, receiver and
//! `function@arg@arg` payload of an [`UnsignedTransaction`], or publishes
//! the Warp itself as an inscription.
//!
//! [`UnsignedTransaction`]: warp_intents_types::UnsignedTransaction

pub mod assembler;
pub mod codec;
pub mod error;
pub mod gas;

pub use assembler::{AssemblySource, TransactionAssembler};
pub use codec::{to_atomic, ArgEncoder, CodecError};
pub use error::AssemblyError;
pub use gas::{GasEstimator, LinearGasEstimator};

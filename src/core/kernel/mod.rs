//! Exchange-agnostic request authentication primitives
//!
//! The kernel holds the pieces every exchange module shares when it signs a
//! request: the `Signer` interface and the process-wide nonce source.
//! Exchange modules implement `Signer` with their own construction.
//!
//! ```rust
//! use krakenshort::core::kernel::next_nonce;
//!
//! let first = next_nonce();
//! let second = next_nonce();
//! assert!(second > first);
//! ```
pub mod nonce;
pub mod signer;

pub use nonce::next_nonce;
pub use signer::{SignatureResult, Signer};

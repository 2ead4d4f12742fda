#![cfg_attr(not(feature = "std"), no_std)]
#![deny(
    warnings,
    unused,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    unsafe_code,
    unused_crate_dependencies
)]

//! Elastic roster resharing for additively shared cluster keys.
//! Built using [Arkworks](https://arkworks.rs/)
//!
//! Every participant of the cluster holds an additive share of the collective secret key and a row
//! of ephemeral secrets (the blinding exponents of the distributed deterministic tagging protocol).
//! This crate grows such a cluster from `N` to `N + k` participants without running a new key
//! generation ceremony, while keeping the collective public key and the column sums of the
//! ephemeral matrix unchanged.
//!
//! # Features
//!
//! - Additive secret splitting over any arkworks prime-order group
//! - Donor based roster replication that preserves all aggregate values
//! - TOML roster files with atomic writes (`std` feature)
//! - `no_std` core
//!
//! # Usage
//!
//! ```no_run
//! # #[cfg(feature = "std")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ark_std::rand::rngs::OsRng;
//! use rosterkit::{DefaultCurve, Roster};
//!
//! let roster: Roster<DefaultCurve> = rosterkit::codec::load("roster.toml")?;
//! let grown = rosterkit::replicate(&mut OsRng, &roster, 3)?;
//! assert_eq!(grown.aggregate_public_key(), roster.aggregate_public_key());
//! rosterkit::codec::save("roster-grown.toml", &grown)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "std"))]
//! # fn main() {}
//! ```

extern crate alloc;

/// Canonical hex encoding of Arkworks values
pub mod ark;

/// Roster files (TOML)
#[cfg(feature = "std")]
pub mod codec;

/// Secret and Public keys
pub mod keys;

/// Growing the roster
pub mod replicate;

/// Participants and the roster they form
pub mod roster;

/// Additive secret splitting
pub mod split;

// Re-exports for convenience
pub use keys::{PublicKey, SecretKey};
pub use replicate::replicate;
pub use roster::{Node, Roster};

/// The group used for roster files when nothing else is specified.
///
/// Public keys live in G2 of BLS12-381, secret keys and ephemeral secrets in its scalar field.
pub type DefaultCurve = ark_bls12_381::G2Projective;

/// Scalar field of a curve group.
pub type Scalar<C> = <C as ark_ec::Group>::ScalarField;

/// The kinds of failure a roster operation can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
pub enum ErrorKind {
    /// invalid argument
    InvalidArgument,
    /// dimension error
    Dimension,
    /// decode error
    Decode,
    /// randomness error
    Randomness,
    /// I/O error
    Io,
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_SUPPORTED_RUST_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

// used for benchmarking
#[cfg(test)]
#[allow(unused)]
pub use criterion as _;

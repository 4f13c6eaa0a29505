//! Shared primitives for the Cirrolus peer-to-peer node.
//!
//! This crate has no network or filesystem logic of its own; it holds the
//! pieces every other crate in the workspace needs: the error taxonomy, the
//! fixed-width big-endian codec, and SHA-256 helpers.

pub mod codec;
pub mod error;
pub mod hashing;

pub use error::{CoreError, CoreResult};

//! The fragmentation engine: splitting files into polynomial-share
//! fragments, reconstructing them, and laying them out on disk.
//!
//! This crate has no networking of its own — it is the pure, synchronous
//! core the peer protocol engine drives. It is organized the way the
//! algorithm is organized:
//!
//! - [`polynomial`]: modular polynomial arithmetic over the fixed field prime
//! - [`meta`] / [`wire`]: the fragment file's JSON header and byte framing
//! - [`split`]: cutting a file into `n` fragments
//! - [`combine`]: reconstructing a file from a subset of fragments
//! - [`store`]: where fragments live on disk
//! - [`cipher`]: the pluggable content-cipher trait used around split/combine

pub mod cipher;
pub mod combine;
pub mod meta;
pub mod polynomial;
pub mod split;
pub mod store;
pub mod wire;

pub use cipher::ContentCipher;
pub use combine::{combine_fragments, CombineOutput};
pub use meta::FragmentMeta;
pub use split::{split_bytes, split_file, SplitOutput, MIN_FRAGMENTS};
pub use store::FragmentStore;

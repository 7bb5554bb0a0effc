//! ChaCha20 + custom Merkle-AR digest pipeline.
//!
//! This crate computes a deterministic 64-byte digest over an arbitrary byte
//! buffer by composing two primitives in a fixed pipeline:
//!
//! 1. a ChaCha20 stream cipher, applied in place to the input buffer
//!    (RFC 8439 permutation, 96-bit nonce, 32-bit counter);
//! 2. a binary Merkle-style reduction whose internal nodes are produced by a
//!    custom 16-lane add-rotate (AR) compression function, `merge_hash`.
//!
//! Given a 256-bit key, a 96-bit nonce, and a length-`L` input:
//!
//! ```text
//! digest = Merkle(ChaCha20(key, nonce, 0, input))
//! ```
//!
//! # Module overview
//!
//! - `chacha`
//!   The ChaCha20 block function and the in-place encryption driver, including
//!   the block-count-tiered parallel dispatch described in the pipeline design.
//!
//! - `merkle`
//!   The AR compression function `merge_hash` and the level-by-level Merkle
//!   reducer that folds a `2^n`-leaf buffer down to a single 64-byte root.
//!
//! - `simd`
//!   CPU-feature detection and the accelerated/scalar XOR helper shared by
//!   both stages.
//!
//! # Design goals
//!
//! - No I/O, no allocation beyond the Merkle stage's two scratch buffers.
//! - Byte-identical output regardless of thread count or SIMD availability.
//! - No authentication, no streaming, no variable-length Merkle tail: this is
//!   a single fixed-shape digest, not a general-purpose hash construction.
//!
//! This crate does not implement authenticated encryption, incremental
//! digests, or hardware-portable SIMD. See [`merkle::merkel_tree`] and
//! [`chacha::chacha20_encrypt`] for the constituent contracts.

pub mod chacha;
pub mod merkle;
mod pipeline;
mod simd;
mod threads;

pub use chacha::chacha20_encrypt;
pub use merkle::merkel_tree;
pub use pipeline::mercha;

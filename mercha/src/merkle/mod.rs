//! The custom AR (add-rotate) compression function and the Merkle reduction
//! built on top of it.
//!
//! `merge_hash` is not a standard hash function; its exact round schedule
//! (anti-diagonal XOR seeding, 10 rounds of distance-4/rotate-7 then
//! distance-8/rotate-9 mixing, final anti-diagonal addition) is preserved
//! as specified and must not be substituted with a textbook construction.

mod compress;
mod reduce;

pub(crate) use compress::merge_hash;
pub use reduce::merkel_tree;

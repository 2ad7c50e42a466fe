//! Shared foundational types used across the Tessel legalization toolchain.
//!
//! This crate provides dense ID-indexed arenas, the [`define_id!`] macro used
//! by every crate to declare its opaque entity IDs, and the internal error
//! type for broken invariants.

#![warn(missing_docs)]

pub mod arena;
pub mod id;
pub mod result;

pub use arena::{Arena, ArenaId};
pub use result::{InternalError, TesselResult};

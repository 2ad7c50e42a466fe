//! Cluster-to-slot placement.
//!
//! [`ClusterPlacer`] binds clusters (or the macros they belong to) to
//! concrete slots in a [`PlacementTable`]; [`RelocationSearch`] finds the
//! nearest free slot when the desired one is taken. Both walk the device with
//! the lazy rings in [`ring`].

mod macros;
mod placer;
mod relocate;
pub mod ring;
mod table;

pub use macros::{MacroMember, PlaceMacro, PlaceMacros};
pub use placer::ClusterPlacer;
pub use relocate::RelocationSearch;
pub use ring::{ManhattanRing, Spiral};
pub use table::PlacementTable;

//! Opaque ID newtypes for netlist, packing, and placement entities.
//!
//! Clusters are destroyed and recreated during retries, so everything refers
//! to them through these indices rather than references.

use tessel_common::define_id;

define_id!(
    /// ID of an atomic block in the [`AtomNetlist`](crate::netlist::AtomNetlist).
    AtomBlockId
);

define_id!(
    /// ID of a net in the [`AtomNetlist`](crate::netlist::AtomNetlist).
    AtomNetId
);

define_id!(
    /// ID of a molecule produced by prepacking.
    MoleculeId
);

define_id!(
    /// ID of a cluster. Stable only until the oracle is compressed.
    ClusterId
);

define_id!(
    /// ID of a rigid placement macro.
    MacroId
);

define_id!(
    /// ID of an attraction group.
    AttractGroupId
);

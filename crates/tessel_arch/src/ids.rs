//! Opaque ID newtypes for architecture entities.
//!
//! Each ID indexes an [`Arena`](tessel_common::Arena) owned by
//! [`Architecture`](crate::Architecture).

use tessel_common::define_id;

define_id!(
    /// ID of an atomic primitive model (e.g. `lut`, `ff`).
    ModelId
);

define_id!(
    /// ID of a logical block type, the template a cluster is built from.
    LogicalTypeId
);

define_id!(
    /// ID of a physical tile type occupying one or more grid cells.
    PhysicalTypeId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn distinct_ids_hash_apart() {
        let mut set = HashSet::new();
        set.insert(LogicalTypeId::from_raw(0));
        set.insert(LogicalTypeId::from_raw(1));
        set.insert(LogicalTypeId::from_raw(0));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = PhysicalTypeId::from_raw(9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<PhysicalTypeId>(&json).unwrap(), id);
    }
}

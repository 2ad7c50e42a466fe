//! Precomputed model → candidate logical block type table.

use crate::ids::{LogicalTypeId, ModelId};
use crate::Architecture;
use std::collections::HashMap;

/// For every model, the logical block types with at least one mode able to
/// hold it, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CandidateTypeTable {
    by_model: HashMap<ModelId, Vec<LogicalTypeId>>,
}

impl CandidateTypeTable {
    /// Builds the table for every model of `arch`.
    pub fn build(arch: &Architecture) -> Self {
        let mut by_model: HashMap<ModelId, Vec<LogicalTypeId>> = HashMap::new();
        for (type_id, block_type) in arch.logical_types.iter() {
            for (model_id, _) in arch.models.iter() {
                if block_type
                    .modes
                    .iter()
                    .any(|mode| mode.capacity_for(model_id) > 0)
                {
                    by_model.entry(model_id).or_default().push(type_id);
                }
            }
        }
        Self { by_model }
    }

    /// Returns the candidate types for `model`; empty if none can hold it.
    pub fn candidates(&self, model: ModelId) -> &[LogicalTypeId] {
        self.by_model.get(&model).map(Vec::as_slice).unwrap_or(&[])
    }
}

//! Errors raised while describing an architecture or building a device grid.

/// Errors from architecture construction and grid stamping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchError {
    /// The grid was given a zero dimension.
    #[error("device grid must be non-empty, got {width}x{height}x{layers}")]
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Requested layer count.
        layers: u32,
    },

    /// A tile footprint extends past the device edge.
    #[error("tile '{tile}' at ({x}, {y}, {layer}) does not fit inside the device")]
    FootprintOutOfBounds {
        /// Tile type name.
        tile: String,
        /// Root x.
        x: i32,
        /// Root y.
        y: i32,
        /// Layer.
        layer: i32,
    },

    /// A tile footprint covers a cell that is already assigned.
    #[error("tile '{tile}' overlaps an existing tile at ({x}, {y}, {layer})")]
    FootprintOverlap {
        /// Tile type name.
        tile: String,
        /// Overlapped x.
        x: i32,
        /// Overlapped y.
        y: i32,
        /// Layer.
        layer: i32,
    },

    /// A tile type was declared with a zero-sized footprint.
    #[error("tile '{0}' has a zero-sized footprint")]
    ZeroFootprint(String),

    /// A name was declared twice.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// Entity kind (`model`, `block type`, `tile type`).
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_overlap() {
        let err = ArchError::FootprintOverlap {
            tile: "dsp".to_string(),
            x: 2,
            y: 3,
            layer: 0,
        };
        assert_eq!(
            err.to_string(),
            "tile 'dsp' overlaps an existing tile at (2, 3, 0)"
        );
    }

    #[test]
    fn display_duplicate() {
        let err = ArchError::DuplicateName {
            kind: "model",
            name: "lut".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate model name 'lut'");
    }
}

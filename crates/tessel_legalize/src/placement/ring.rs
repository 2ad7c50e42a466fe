//! Lazy Manhattan-distance rings around a tile.
//!
//! Offsets on a ring of radius `r` are visited with `dx` running from `-r` to
//! `r`; for each `dx` the tile at `dy = r - |dx|` comes before `-dy`. Tiles
//! are not clipped to the device; callers skip what they cannot use.

use tessel_arch::TileLoc;

/// Tiles at exactly Manhattan distance `radius` from a center, on its layer.
#[derive(Debug, Clone)]
pub struct ManhattanRing {
    center: TileLoc,
    radius: i32,
    dx: i32,
    pending: Option<TileLoc>,
}

impl ManhattanRing {
    /// Creates the ring of the given radius around `center`.
    pub fn new(center: TileLoc, radius: u32) -> Self {
        let radius = radius as i32;
        Self {
            center,
            radius,
            dx: -radius,
            pending: None,
        }
    }
}

impl Iterator for ManhattanRing {
    type Item = TileLoc;

    fn next(&mut self) -> Option<TileLoc> {
        if let Some(tile) = self.pending.take() {
            return Some(tile);
        }
        if self.dx > self.radius {
            return None;
        }
        let dx = self.dx;
        self.dx += 1;
        let dy = self.radius - dx.abs();
        if dy != 0 {
            self.pending = Some(self.center.offset(dx, -dy));
        }
        Some(self.center.offset(dx, dy))
    }
}

/// Rings of increasing radius from `0` to `max_radius` inclusive.
#[derive(Debug, Clone)]
pub struct Spiral {
    center: TileLoc,
    max_radius: u32,
    radius: u32,
    ring: ManhattanRing,
}

impl Spiral {
    /// Creates a spiral starting at `center` itself.
    pub fn new(center: TileLoc, max_radius: u32) -> Self {
        Self {
            center,
            max_radius,
            radius: 0,
            ring: ManhattanRing::new(center, 0),
        }
    }

    /// Radius of the ring currently being visited.
    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl Iterator for Spiral {
    type Item = TileLoc;

    fn next(&mut self) -> Option<TileLoc> {
        loop {
            if let Some(tile) = self.ring.next() {
                return Some(tile);
            }
            if self.radius >= self.max_radius {
                return None;
            }
            self.radius += 1;
            self.ring = ManhattanRing::new(self.center, self.radius);
        }
    }
}

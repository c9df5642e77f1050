//! Snap-to-grid settings.

use serde::{Deserialize, Serialize};

/// Smallest allowed grid size in pixels.
pub const MIN_GRID_SIZE: u32 = 8;

/// Largest allowed grid size in pixels.
pub const MAX_GRID_SIZE: u32 = 96;

/// Grid used for placement and drag snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Whether coordinates snap to the grid.
    pub enabled: bool,
    size: u32,
    /// Whether the editor draws the grid overlay.
    pub show: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 24,
            show: true,
        }
    }
}

impl GridSettings {
    /// Create settings, clamping `size` into range.
    #[must_use]
    pub fn new(enabled: bool, size: u32, show: bool) -> Self {
        Self {
            enabled,
            size: size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            show,
        }
    }

    /// Grid spacing in pixels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Set the grid spacing, clamped to `[MIN_GRID_SIZE, MAX_GRID_SIZE]`.
    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
    }

    /// Round `value` to the nearest grid multiple, or return it unchanged when snapping is off.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snap(&self, value: f32) -> f32 {
        if !self.enabled {
            return value;
        }
        let size = self.size as f32;
        (value / size).round() * size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_snap_rounds_to_nearest_multiple() {
        let grid = GridSettings::default();
        assert!((grid.snap(100.0) - 96.0).abs() < f32::EPSILON);
        assert!((grid.snap(110.0) - 120.0).abs() < f32::EPSILON);
        assert!((grid.snap(0.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_snap_disabled_is_identity() {
        let grid = GridSettings::new(false, 24, true);
        assert!((grid.snap(101.3) - 101.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_size_is_clamped() {
        let mut grid = GridSettings::default();
        grid.set_size(2);
        assert_eq!(grid.size(), MIN_GRID_SIZE);
        grid.set_size(500);
        assert_eq!(grid.size(), MAX_GRID_SIZE);
        assert_eq!(GridSettings::new(true, 0, false).size(), MIN_GRID_SIZE);
    }

    proptest! {
        #[test]
        fn prop_snap_is_idempotent(
            size in MIN_GRID_SIZE..=MAX_GRID_SIZE,
            value in -5000.0f32..5000.0f32,
            enabled in any::<bool>(),
        ) {
            let grid = GridSettings::new(enabled, size, true);
            let once = grid.snap(value);
            let twice = grid.snap(once);
            prop_assert_eq!(once.to_bits(), twice.to_bits());
        }
    }
}

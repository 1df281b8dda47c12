//! Disk-shaped paint tool shared by both grid backends.

use crate::core_types::CellType;

/// In-bounds positions within Euclidean distance `radius` of `center`
pub(crate) fn disk(
    center: (u32, u32),
    radius: u32,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (i32, i32)> {
    let (cx, cy) = (i64::from(center.0), i64::from(center.1));
    let r = i64::from(radius);
    let radius_sq = i128::from(r) * i128::from(r);
    let (w, h) = (i64::from(width), i64::from(height));

    // Only the part of the bounding box that overlaps the grid is walked
    let rows = (cy - r).max(0)..=(cy + r).min(h - 1);
    let cols = (cx - r).max(0)..=(cx + r).min(w - 1);

    rows.flat_map(move |gy| {
        cols.clone().filter_map(move |gx| {
            let (dx, dy) = (i128::from(gx - cx), i128::from(gy - cy));
            (dx * dx + dy * dy <= radius_sq).then_some((gx as i32, gy as i32))
        })
    })
}

/// Painting only fills AIR; erasing (painting AIR) overwrites anything.
#[inline]
pub(crate) fn may_paint(existing: CellType, target: CellType) -> bool {
    target == CellType::Air || existing == CellType::Air
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_radius_zero_is_center() {
        let cells: Vec<_> = disk((2, 3), 0, 10, 10).collect();
        assert_eq!(cells, vec![(2, 3)]);
    }

    #[test]
    fn test_disk_is_round_and_clipped() {
        let interior = disk((5, 5), 2, 20, 20).count();
        // 13 lattice points within distance 2
        assert_eq!(interior, 13);

        let corner: Vec<_> = disk((0, 0), 2, 20, 20).collect();
        assert!(corner.iter().all(|&(x, y)| x >= 0 && y >= 0));
        assert_eq!(corner.len(), 6);
    }

    #[test]
    fn test_huge_radius_only_visits_the_grid() {
        let cells: Vec<_> = disk((1, 1), u32::MAX, 4, 4).collect();
        assert_eq!(cells.len(), 16);
        assert!(cells.iter().all(|&(x, y)| (0..4).contains(&x) && (0..4).contains(&y)));
    }

    #[test]
    fn test_center_outside_the_grid() {
        assert_eq!(disk((50, 50), 3, 10, 10).count(), 0);
        assert_eq!(disk((12, 0), 3, 10, 10).count(), 1);
        assert_eq!(disk((11, 0), 3, 10, 10).count(), 4);
        assert_eq!(disk((0, 0), 4, 0, 0).count(), 0);
    }

    #[test]
    fn test_paint_policy() {
        assert!(may_paint(CellType::Air, CellType::Sand));
        assert!(!may_paint(CellType::Stone, CellType::Sand));
        assert!(may_paint(CellType::Stone, CellType::Air));
    }
}

//! Square streaming window around the viewpoint chunk

use crate::voxel::chunk::ChunkCoord;

/// Largest accepted window radius; a window this size is already far more
/// than any registry can hold.
pub const MAX_WINDOW_RADIUS: i32 = 4096;

/// Coordinates within Chebyshev distance `radius` of `center`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamingWindow {
    pub center: ChunkCoord,
    pub radius: i32,
}

impl StreamingWindow {
    pub fn new(center: ChunkCoord, radius: i32) -> Self {
        Self {
            center,
            radius: radius.clamp(0, MAX_WINDOW_RADIUS),
        }
    }

    /// Chunks along one side
    pub fn side(&self) -> i32 {
        2 * self.radius + 1
    }

    /// Number of coordinates in the window
    pub fn area(&self) -> usize {
        (self.side() as usize).pow(2)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.center.chebyshev_distance(coord) <= self.radius
    }

    /// All coordinates, nearest ring first. Near the ends of the `i32` range
    /// the window is cut off rather than wrapped.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let mut coords = Vec::with_capacity(self.area());
        for dy in -self.radius..=self.radius {
            let Some(y) = self.center.y.checked_add(dy) else {
                continue;
            };
            for dx in -self.radius..=self.radius {
                if let Some(x) = self.center.x.checked_add(dx) {
                    coords.push(ChunkCoord::new(x, y));
                }
            }
        }
        coords.sort_by_key(|c| (self.center.chebyshev_distance(*c), c.y, c.x));
        coords
    }

    /// Coordinates in `self` but not in `other`, nearest to `self.center` first
    pub fn difference(&self, other: &StreamingWindow) -> Vec<ChunkCoord> {
        self.coords().into_iter().filter(|c| !other.contains(*c)).collect()
    }
}

/// Split a recentering into `(entering, leaving)` coordinate lists
pub fn diff_windows(old: &StreamingWindow, new: &StreamingWindow) -> (Vec<ChunkCoord>, Vec<ChunkCoord>) {
    (new.difference(old), old.difference(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_window_area() {
        let window = StreamingWindow::new(ChunkCoord::new(0, 0), 2);
        assert_eq!(window.area(), 25);
        assert_eq!(window.coords().len(), 25);
        assert_eq!(StreamingWindow::new(ChunkCoord::new(3, 3), 0).coords(), vec![ChunkCoord::new(3, 3)]);
    }

    #[test]
    fn test_coords_nearest_first() {
        let window = StreamingWindow::new(ChunkCoord::new(-4, 7), 3);
        let coords = window.coords();
        assert_eq!(coords[0], window.center);
        let distances: Vec<_> = coords.iter().map(|c| window.center.chebyshev_distance(*c)).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_single_step_diff() {
        let old = StreamingWindow::new(ChunkCoord::new(0, 0), 2);
        let new = StreamingWindow::new(ChunkCoord::new(1, 0), 2);
        let (entering, leaving) = diff_windows(&old, &new);

        assert_eq!(entering.len(), 5);
        assert_eq!(leaving.len(), 5);
        assert!(entering.iter().all(|c| c.x == 3));
        assert!(leaving.iter().all(|c| c.x == -2));
    }

    #[test]
    fn test_diagonal_diff() {
        let old = StreamingWindow::new(ChunkCoord::new(0, 0), 1);
        let new = StreamingWindow::new(ChunkCoord::new(1, 1), 1);
        let (entering, leaving) = diff_windows(&old, &new);
        assert_eq!(entering.len(), 5);
        assert_eq!(leaving.len(), 5);
    }

    #[test]
    fn test_disjoint_jump() {
        let old = StreamingWindow::new(ChunkCoord::new(0, 0), 2);
        let new = StreamingWindow::new(ChunkCoord::new(100, -50), 2);
        let (entering, leaving) = diff_windows(&old, &new);

        let entering: HashSet<_> = entering.into_iter().collect();
        let leaving: HashSet<_> = leaving.into_iter().collect();
        assert_eq!(entering, new.coords().into_iter().collect());
        assert_eq!(leaving, old.coords().into_iter().collect());
    }

    #[test]
    fn test_window_at_i32_edge_is_cut_off() {
        let window = StreamingWindow::new(ChunkCoord::new(i32::MAX, i32::MIN), 1);
        let coords = window.coords();
        assert_eq!(coords.len(), 4);
        assert!(coords.iter().all(|c| window.contains(*c)));
    }

    #[test]
    fn test_radius_clamped() {
        assert_eq!(StreamingWindow::new(ChunkCoord::new(0, 0), -3).radius, 0);
        assert_eq!(StreamingWindow::new(ChunkCoord::new(0, 0), i32::MAX).radius, MAX_WINDOW_RADIUS);
    }

    #[test]
    fn test_same_window_no_diff() {
        let window = StreamingWindow::new(ChunkCoord::new(5, 5), 4);
        let (entering, leaving) = diff_windows(&window, &window);
        assert!(entering.is_empty());
        assert!(leaving.is_empty());
    }
}

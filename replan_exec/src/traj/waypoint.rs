//! Waypoints and the moving window over them

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A waypoint, ordered (x, y, z, yaw).
///
/// Units: meters for the positional axes, radians for yaw.
pub type Waypoint = Vector4<f64>;

/// A contiguous run of waypoints taken from the full sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointWindow {
    /// Index of the first waypoint of the window in the full sequence
    start_index: usize,

    /// The waypoints in the window
    waypoints: Vec<Waypoint>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An axis of a waypoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    Yaw
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Axis {
    /// All axes in waypoint order.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::Yaw];

    /// The positional axes.
    pub const POSITION: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index of the axis within a waypoint.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::Yaw => 3
        }
    }
}

impl WaypointWindow {
    /// Take the window `[start_index, start_index + size)` from the full sequence.
    ///
    /// Returns `None` if fewer than `size` waypoints remain from `start_index`.
    pub fn from_slice(full: &[Waypoint], start_index: usize, size: usize) -> Option<Self> {
        let end_index = start_index.checked_add(size)?;

        full.get(start_index..end_index).map(|s| Self {
            start_index,
            waypoints: s.to_vec()
        })
    }

    /// Produce the window following this one.
    ///
    /// The last `len() - stride` waypoints of this window are carried over as the head of the
    /// next window, and only the newly revealed waypoints are taken from `full`. Returns `None`
    /// if `full` does not hold enough waypoints to complete the next window, or if `stride` is
    /// zero or larger than the window.
    pub fn advance(&self, full: &[Waypoint], stride: usize) -> Option<Self> {
        let size = self.len();
        if stride == 0 || stride > size {
            return None;
        }

        let start_index = self.start_index + stride;
        let revealed_start = self.start_index + size;
        let revealed = full.get(revealed_start..(start_index + size))?;

        let mut waypoints = Vec::with_capacity(size);
        waypoints.extend_from_slice(&self.waypoints[stride..]);
        waypoints.extend_from_slice(revealed);

        Some(Self {
            start_index,
            waypoints
        })
    }

    /// Index of the first waypoint in the full sequence.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Index one past the last waypoint in the full sequence.
    pub fn end_index(&self) -> usize {
        self.start_index + self.waypoints.len()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Get the values of one axis across the window.
    pub fn axis_values(&self, axis: Axis) -> Vec<f64> {
        self.waypoints.iter().map(|w| w[axis.index()]).collect()
    }

    /// Number of full-sequence waypoints shared between this window and `other`.
    pub fn overlap_with(&self, other: &Self) -> usize {
        let start = self.start_index.max(other.start_index);
        let end = self.end_index().min(other.end_index());
        end.saturating_sub(start)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ramp(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| {
                let f = i as f64;
                Waypoint::new(f, 2.0 * f, -f, 0.1 * f)
            })
            .collect()
    }

    #[test]
    fn test_from_slice() {
        let full = ramp(10);

        let w = WaypointWindow::from_slice(&full, 4, 4).unwrap();
        assert_eq!(w.start_index(), 4);
        assert_eq!(w.end_index(), 8);
        assert_eq!(w.waypoints()[0], full[4]);
        assert_eq!(w.axis_values(Axis::Y), vec![8.0, 10.0, 12.0, 14.0]);

        assert!(WaypointWindow::from_slice(&full, 8, 4).is_none());
        assert!(WaypointWindow::from_slice(&full, 6, 4).is_some());
    }

    #[test]
    fn test_advance_overlap() {
        let full = ramp(10);

        let w0 = WaypointWindow::from_slice(&full, 0, 4).unwrap();
        let w1 = w0.advance(&full, 2).unwrap();

        // Two waypoints shared, equal by value
        assert_eq!(w0.overlap_with(&w1), 2);
        assert_eq!(w0.waypoints()[2], w1.waypoints()[0]);
        assert_eq!(w0.waypoints()[3], w1.waypoints()[1]);

        // The carried-over tail plus the revealed waypoints is the plain slice
        assert_eq!(w1, WaypointWindow::from_slice(&full, 2, 4).unwrap());

        // Running out of waypoints
        let w2 = w1.advance(&full, 2).unwrap();
        let w3 = w2.advance(&full, 2).unwrap();
        assert_eq!(w3.start_index(), 6);
        assert!(w3.advance(&full, 2).is_none());
    }

    #[test]
    fn test_advance_invalid_stride() {
        let full = ramp(10);
        let w0 = WaypointWindow::from_slice(&full, 0, 4).unwrap();

        assert!(w0.advance(&full, 0).is_none());
        assert!(w0.advance(&full, 5).is_none());

        // A stride of the full window leaves no overlap
        let w1 = w0.advance(&full, 4).unwrap();
        assert_eq!(w0.overlap_with(&w1), 0);
        assert_eq!(w1.start_index(), 4);
    }
}

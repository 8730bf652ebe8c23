//! # Refinement boundary
//!
//! An optional corrector applied to each fitted window before it is sampled, for example a model
//! trained offline to adjust the coefficients for a particular vehicle configuration. The
//! corrector is injected by the caller and is treated as a black box; the only requirement is
//! that it preserves the number and timing of the segments.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::traj::Segment;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Maps a fitted window onto a refined one.
pub trait Refiner {
    /// Refine the segments of a window for the configuration `config_id`.
    fn refine(&self, segments: &[Segment], config_id: u32) -> Result<Vec<Segment>, RefineError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A refiner which returns the segments unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRefiner;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by, or about the output of, a refiner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefineError {
    #[error("No refinement is available for configuration {0}")]
    UnknownConfig(u32),

    #[error("Refinement changed the number of segments from {expected} to {found}")]
    SegmentCountChanged { expected: usize, found: usize },

    #[error("Refinement changed the duration of segment {0}")]
    SegmentDurationChanged(usize),

    #[error("Refinement failed: {0}")]
    Failed(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Refiner for IdentityRefiner {
    fn refine(&self, segments: &[Segment], _config_id: u32) -> Result<Vec<Segment>, RefineError> {
        Ok(segments.to_vec())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run a refiner and check that its output still lines up with the breakpoints of the input.
pub fn refine_checked(
    refiner: &dyn Refiner,
    segments: &[Segment],
    config_id: u32,
) -> Result<Vec<Segment>, RefineError> {
    let refined = refiner.refine(segments, config_id)?;

    if refined.len() != segments.len() {
        return Err(RefineError::SegmentCountChanged {
            expected: segments.len(),
            found: refined.len(),
        });
    }

    for (i, (a, b)) in segments.iter().zip(refined.iter()).enumerate() {
        if a.duration_s != b.duration_s {
            return Err(RefineError::SegmentDurationChanged(i));
        }
    }

    Ok(refined)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj::Poly;

    fn segments() -> Vec<Segment> {
        let p = Poly::new(vec![1.0, 0.0]);
        vec![
            Segment {
                axes: [p.clone(), p.clone(), p.clone(), p.clone()],
                duration_s: 1.0,
            };
            2
        ]
    }

    struct DropLast;

    impl Refiner for DropLast {
        fn refine(&self, segments: &[Segment], _: u32) -> Result<Vec<Segment>, RefineError> {
            Ok(segments[..segments.len() - 1].to_vec())
        }
    }

    struct Stretch;

    impl Refiner for Stretch {
        fn refine(&self, segments: &[Segment], _: u32) -> Result<Vec<Segment>, RefineError> {
            let mut s = segments.to_vec();
            s[1].duration_s *= 2.0;
            Ok(s)
        }
    }

    #[test]
    fn test_identity() {
        let s = segments();
        assert_eq!(refine_checked(&IdentityRefiner, &s, 1).unwrap(), s);
    }

    #[test]
    fn test_checks() {
        let s = segments();
        assert_eq!(
            refine_checked(&DropLast, &s, 1),
            Err(RefineError::SegmentCountChanged {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            refine_checked(&Stretch, &s, 1),
            Err(RefineError::SegmentDurationChanged(1))
        );
    }
}

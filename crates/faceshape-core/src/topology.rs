//! Face-mesh landmark indices consumed by the shape classifier.
//!
//! These follow the 468-point MediaPipe face-mesh topology and must not be
//! renumbered; a different mesh model needs its own table.

/// Number of landmarks the face-mesh model produces per face.
pub const MESH_LANDMARK_COUNT: usize = 468;

/// Jawline contour from the left face edge, around the chin, to the right jaw.
pub const JAWLINE: [usize; 16] = [
    234, 93, 132, 58, 172, 136, 149, 148, 152, 377, 400, 378, 379, 365, 397, 288,
];

/// Top of the forehead (mesh midline).
pub const FACE_TOP: usize = 10;
/// Bottom of the chin (mesh midline).
pub const CHIN: usize = 152;

pub const FOREHEAD_LEFT: usize = 234;
pub const FOREHEAD_RIGHT: usize = 454;

pub const CHEEKBONE_LEFT: usize = 116;
pub const CHEEKBONE_RIGHT: usize = 345;

/// Highest index any classification policy reads.
pub const MAX_REFERENCED_INDEX: usize = 454;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_referenced_index() {
        let max = JAWLINE
            .iter()
            .copied()
            .chain([FACE_TOP, CHIN, FOREHEAD_LEFT, FOREHEAD_RIGHT, CHEEKBONE_LEFT, CHEEKBONE_RIGHT])
            .max()
            .unwrap();
        assert_eq!(max, MAX_REFERENCED_INDEX);
        assert!(MAX_REFERENCED_INDEX < MESH_LANDMARK_COUNT);
    }

    #[test]
    fn test_jawline_passes_through_chin() {
        assert_eq!(JAWLINE[8], CHIN);
        assert_eq!(JAWLINE[0], FOREHEAD_LEFT);
    }
}

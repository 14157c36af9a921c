//! Facial landmark input and the per-eye index lookup.
//!
//! Landmarks follow the 68-point Multi-PIE (dlib) ordering. Only the eye
//! contours (indices 36–47) are consumed by the pipeline, so a set is
//! accepted as soon as it reaches index 47.

use std::path::Path;

/// Number of points in a full Multi-PIE landmark set.
pub const MULTI_PIE_POINTS: usize = 68;

/// Minimum number of points required to address both eye contours.
pub const MIN_LANDMARK_POINTS: usize = 48;

/// Largest absolute landmark coordinate kept; larger values are clamped.
pub const MAX_LANDMARK_COORD: i32 = 1 << 20;

const LEFT_EYE_INDICES: [usize; 6] = [36, 37, 38, 39, 40, 41];
const RIGHT_EYE_INDICES: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Which eye to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeSide {
    Left,
    Right,
}

impl EyeSide {
    /// Both sides in processing order.
    pub const BOTH: [EyeSide; 2] = [EyeSide::Left, EyeSide::Right];

    /// Landmark indices of the eye contour in canonical order:
    /// outer corner, two upper-lid points, inner corner, two lower-lid points.
    pub fn landmark_indices(self) -> [usize; 6] {
        match self {
            Self::Left => LEFT_EYE_INDICES,
            Self::Right => RIGHT_EYE_INDICES,
        }
    }

    /// Stable array slot for per-side storage.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl std::fmt::Display for EyeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Errors raised when building a [`LandmarkSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    /// The set does not reach the last eye-contour index.
    TooFewPoints {
        /// Required minimum number of points.
        needed: usize,
        /// Provided number of points.
        got: usize,
    },
}

impl std::fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few landmark points: need {}, got {}", needed, got)
            }
        }
    }
}

impl std::error::Error for LandmarkError {}

/// Ordered facial keypoints in integer frame pixels.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<[i32; 2]>,
}

impl LandmarkSet {
    /// Build a landmark set, rejecting sets that stop before the eye contours.
    ///
    /// Coordinates are clamped to `±MAX_LANDMARK_COORD`.
    pub fn new(mut points: Vec<[i32; 2]>) -> Result<Self, LandmarkError> {
        if points.len() < MIN_LANDMARK_POINTS {
            return Err(LandmarkError::TooFewPoints {
                needed: MIN_LANDMARK_POINTS,
                got: points.len(),
            });
        }
        for p in &mut points {
            *p = p.map(clamp_coord);
        }
        Ok(Self { points })
    }

    /// Load a landmark set from a JSON array of `[x, y]` pairs.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let points: Vec<[i32; 2]> = serde_json::from_str(&data)?;
        Self::new(points).map_err(Into::into)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at a Multi-PIE index, if present.
    pub fn get(&self, index: usize) -> Option<[i32; 2]> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[[i32; 2]] {
        &self.points
    }

    /// The six contour points of one eye, in canonical order.
    pub fn eye_points(&self, side: EyeSide) -> [[i32; 2]; 6] {
        // Length is checked at construction, so every eye index is in range.
        side.landmark_indices().map(|i| self.points[i])
    }
}

#[inline]
pub(crate) fn clamp_coord(v: i32) -> i32 {
    v.clamp(-MAX_LANDMARK_COORD, MAX_LANDMARK_COORD)
}

impl<'de> serde::Deserialize<'de> for LandmarkSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<[i32; 2]>::deserialize(deserializer)?;
        Self::new(points).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Vec<[i32; 2]>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: Vec<[i32; 2]>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sets_without_eye_contours() {
        let err = LandmarkSet::new(vec![[0, 0]; 47]).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::TooFewPoints {
                needed: 48,
                got: 47
            }
        );
        assert!(LandmarkSet::new(vec![[0, 0]; 48]).is_ok());
    }

    #[test]
    fn eye_points_follow_side_indices() {
        let points: Vec<[i32; 2]> = (0..68).map(|i| [i, 100 + i]).collect();
        let set = LandmarkSet::new(points).unwrap();
        assert_eq!(set.eye_points(EyeSide::Left)[0], [36, 136]);
        assert_eq!(set.eye_points(EyeSide::Left)[5], [41, 141]);
        assert_eq!(set.eye_points(EyeSide::Right)[0], [42, 142]);
        assert_eq!(set.eye_points(EyeSide::Right)[5], [47, 147]);
    }

    #[test]
    fn json_deserialization_validates_length() {
        let short: Result<LandmarkSet, _> = serde_json::from_str("[[1, 2], [3, 4]]");
        assert!(short.is_err());

        let full = serde_json::to_string(&vec![[5, 6]; 68]).unwrap();
        let set: LandmarkSet = serde_json::from_str(&full).unwrap();
        assert_eq!(set.len(), MULTI_PIE_POINTS);
        assert_eq!(set.get(67), Some([5, 6]));
        assert_eq!(set.get(68), None);
    }

    #[test]
    fn extreme_coordinates_are_clamped() {
        let mut points = vec![[0, 0]; 68];
        points[36] = [i32::MAX, i32::MIN];
        let set = LandmarkSet::new(points).unwrap();
        assert_eq!(
            set.eye_points(EyeSide::Left)[0],
            [MAX_LANDMARK_COORD, -MAX_LANDMARK_COORD]
        );
        assert_eq!(set.get(0), Some([0, 0]));
    }

    #[test]
    fn side_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&EyeSide::Right).unwrap(), "\"right\"");
        assert_eq!(EyeSide::Left.to_string(), "left");
    }
}

//! Body landmark vocabulary and landmark sets.
//!
//! The vocabulary is the closed 33-point BlazePose topology. Names are the
//! upper snake case strings used in serialized output (`LEFT_SHOULDER`), and
//! ids are the model's output indices.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! landmark_names {
    ($($variant:ident = $id:literal => $name:literal),+ $(,)?) => {
        /// A named anatomical point in the 33-entry pose vocabulary.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum LandmarkName {
            $(
                #[serde(rename = $name)]
                $variant = $id,
            )+
        }

        impl LandmarkName {
            /// Every name, in model output order.
            pub const ALL: [LandmarkName; 33] = [$(LandmarkName::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(LandmarkName::$variant => $name,)+
                }
            }
        }
    };
}

landmark_names! {
    Nose = 0 => "NOSE",
    LeftEyeInner = 1 => "LEFT_EYE_INNER",
    LeftEye = 2 => "LEFT_EYE",
    LeftEyeOuter = 3 => "LEFT_EYE_OUTER",
    RightEyeInner = 4 => "RIGHT_EYE_INNER",
    RightEye = 5 => "RIGHT_EYE",
    RightEyeOuter = 6 => "RIGHT_EYE_OUTER",
    LeftEar = 7 => "LEFT_EAR",
    RightEar = 8 => "RIGHT_EAR",
    MouthLeft = 9 => "MOUTH_LEFT",
    MouthRight = 10 => "MOUTH_RIGHT",
    LeftShoulder = 11 => "LEFT_SHOULDER",
    RightShoulder = 12 => "RIGHT_SHOULDER",
    LeftElbow = 13 => "LEFT_ELBOW",
    RightElbow = 14 => "RIGHT_ELBOW",
    LeftWrist = 15 => "LEFT_WRIST",
    RightWrist = 16 => "RIGHT_WRIST",
    LeftPinky = 17 => "LEFT_PINKY",
    RightPinky = 18 => "RIGHT_PINKY",
    LeftIndex = 19 => "LEFT_INDEX",
    RightIndex = 20 => "RIGHT_INDEX",
    LeftThumb = 21 => "LEFT_THUMB",
    RightThumb = 22 => "RIGHT_THUMB",
    LeftHip = 23 => "LEFT_HIP",
    RightHip = 24 => "RIGHT_HIP",
    LeftKnee = 25 => "LEFT_KNEE",
    RightKnee = 26 => "RIGHT_KNEE",
    LeftAnkle = 27 => "LEFT_ANKLE",
    RightAnkle = 28 => "RIGHT_ANKLE",
    LeftHeel = 29 => "LEFT_HEEL",
    RightHeel = 30 => "RIGHT_HEEL",
    LeftFootIndex = 31 => "LEFT_FOOT_INDEX",
    RightFootIndex = 32 => "RIGHT_FOOT_INDEX",
}

impl LandmarkName {
    pub const COUNT: usize = 33;

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }
}

impl fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLandmark(pub String);

impl fmt::Display for UnknownLandmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown landmark name: {}", self.0)
    }
}

impl std::error::Error for UnknownLandmark {}

impl FromStr for LandmarkName {
    type Err = UnknownLandmark;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|name| name.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownLandmark(s.to_string()))
    }
}

/// A single landmark: normalized position, relative depth and visibility.
///
/// `x` and `y` are in [0, 1] relative to whichever image produced them
/// (a crop or the full frame); `z` is unitless and unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold
    }
}

/// Landmarks of one person keyed by name.
///
/// Serializes as a JSON object from name to landmark; ordering follows the
/// vocabulary ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: BTreeMap<LandmarkName, Landmark>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: LandmarkName, landmark: Landmark) {
        self.points.insert(name, landmark);
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.points.get(&name)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = LandmarkName> + '_ {
        self.points.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkName, &Landmark)> {
        self.points.iter().map(|(name, lm)| (*name, lm))
    }

    /// Applies `f` to every landmark, producing a new set with the same names.
    pub fn map(&self, mut f: impl FnMut(&Landmark) -> Landmark) -> LandmarkSet {
        LandmarkSet {
            points: self.points.iter().map(|(n, lm)| (*n, f(lm))).collect(),
        }
    }
}

impl FromIterator<(LandmarkName, Landmark)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (LandmarkName, Landmark)>>(iter: I) -> Self {
        LandmarkSet {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_vocabulary_has_33_entries_in_id_order() {
        assert_eq!(LandmarkName::ALL.len(), LandmarkName::COUNT);
        for (i, name) in LandmarkName::ALL.iter().enumerate() {
            assert_eq!(name.id() as usize, i);
        }
    }

    #[rstest]
    #[case(0, LandmarkName::Nose, "NOSE")]
    #[case(7, LandmarkName::LeftEar, "LEFT_EAR")]
    #[case(12, LandmarkName::RightShoulder, "RIGHT_SHOULDER")]
    #[case(23, LandmarkName::LeftHip, "LEFT_HIP")]
    #[case(28, LandmarkName::RightAnkle, "RIGHT_ANKLE")]
    fn test_id_and_name_agree(#[case] id: usize, #[case] name: LandmarkName, #[case] text: &str) {
        assert_eq!(LandmarkName::from_id(id), Some(name));
        assert_eq!(name.as_str(), text);
        assert_eq!(text.parse::<LandmarkName>().unwrap(), name);
    }

    #[test]
    fn test_from_id_out_of_range() {
        assert_eq!(LandmarkName::from_id(33), None);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "LEFT_TAIL".parse::<LandmarkName>().unwrap_err();
        assert_eq!(err, UnknownLandmark("LEFT_TAIL".to_string()));
    }

    #[test]
    fn test_landmark_visibility_threshold() {
        let lm = Landmark::new(0.5, 0.5, 0.0, 0.6);
        assert!(lm.is_visible(0.5));
        assert!(!lm.is_visible(0.7));
    }

    #[test]
    fn test_set_serializes_as_named_map() {
        let set: LandmarkSet = [(LandmarkName::Nose, Landmark::new(0.5, 0.25, -0.1, 0.9))]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["NOSE"]["x"], 0.5);
        assert_eq!(json["NOSE"]["visibility"], 0.9);
    }

    #[test]
    fn test_map_keeps_names() {
        let set: LandmarkSet = [
            (LandmarkName::LeftHip, Landmark::new(0.1, 0.2, 0.0, 1.0)),
            (LandmarkName::RightHip, Landmark::new(0.3, 0.4, 0.0, 1.0)),
        ]
        .into_iter()
        .collect();
        let shifted = set.map(|lm| Landmark { x: lm.x + 0.5, ..*lm });
        assert_eq!(shifted.len(), 2);
        assert!((shifted.get(LandmarkName::RightHip).unwrap().x - 0.8).abs() < 1e-12);
    }
}

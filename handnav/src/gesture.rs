//! Static gesture classification from hand landmarks.
//!
//! Recognizes three counting gestures from a single hand:
//! a thumb/index pinch ("zero"), the index finger alone ("one") and
//! index plus middle ("two").  Pure functions only; the debounce state
//! lives in the dispatcher.
//!
//! Finger extension compares fingertip and PIP heights, which assumes a
//! roughly upright hand facing the camera.  Rotated or inverted hands
//! are not handled.

use crate::landmark::{Finger, HandLandmark, Landmark, LANDMARK_COUNT};
use crate::navigation::Destination;

// ── Gesture labels ─────────────────────────────────────────

/// Recognized gesture labels.  "No gesture" is `None` at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    /// Thumb tip touching index tip.
    Zero,
    /// Index finger extended alone.
    One,
    /// Index and middle fingers extended.
    Two,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
        }
    }

    /// Navigation target bound to this gesture.
    pub fn destination(&self) -> Destination {
        match self {
            Self::Zero => Destination::Dashboard,
            Self::One => Destination::Theory,
            Self::Two => Destination::Practice,
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Thresholds for gesture classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Pinch fires when thumb-index distance is below this fraction of palm size.
    pub pinch_ratio: f32,
    /// Floor applied to the palm size before it is used as a scale.
    pub min_palm_size: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pinch_ratio: 0.35,
            min_palm_size: 0.001,
        }
    }
}

// ── Finger states ──────────────────────────────────────────

/// Extension state of the four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    pub fn is_extended(&self, finger: Finger) -> bool {
        match finger {
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    pub fn extended_count(&self) -> usize {
        Finger::ALL.iter().filter(|f| self.is_extended(**f)).count()
    }
}

/// Tip above PIP in image space (y grows downward).
fn is_extended(landmarks: &[Landmark], finger: Finger) -> bool {
    match (
        landmarks.get(finger.tip().index()),
        landmarks.get(finger.pip().index()),
    ) {
        (Some(tip), Some(pip)) => tip.y < pip.y,
        _ => false,
    }
}

/// Per-finger extension for a complete hand, `None` for partial input.
pub fn finger_states(landmarks: &[Landmark]) -> Option<FingerStates> {
    if landmarks.len() < LANDMARK_COUNT {
        return None;
    }
    Some(FingerStates {
        index: is_extended(landmarks, Finger::Index),
        middle: is_extended(landmarks, Finger::Middle),
        ring: is_extended(landmarks, Finger::Ring),
        pinky: is_extended(landmarks, Finger::Pinky),
    })
}

// ── Classification ─────────────────────────────────────────

impl ClassifierConfig {
    /// Classify one hand.  Returns `None` for fewer than 21 landmarks
    /// or when no rule matches.
    pub fn classify(&self, landmarks: &[Landmark]) -> Option<GestureLabel> {
        let fingers = finger_states(landmarks)?;

        let at = |l: HandLandmark| landmarks[l.index()];
        let palm_size = at(HandLandmark::Wrist)
            .distance(&at(HandLandmark::MiddleMcp))
            .max(self.min_palm_size);
        let pinch_dist = at(HandLandmark::ThumbTip).distance(&at(HandLandmark::IndexTip));

        // Pinch wins regardless of the other fingers
        if pinch_dist < palm_size * self.pinch_ratio {
            return Some(GestureLabel::Zero);
        }

        let extended = fingers.extended_count();

        if extended == 1 && fingers.index {
            return Some(GestureLabel::One);
        }

        if extended == 2 && fingers.index && fingers.middle {
            return Some(GestureLabel::Two);
        }

        None
    }
}

/// Classify one hand with default thresholds.
pub fn classify(landmarks: &[Landmark]) -> Option<GestureLabel> {
    ClassifierConfig::default().classify(landmarks)
}

// ── Test helpers ───────────────────────────────────────────

/// Upright hand with a 0.3 palm and the given fingers raised.
/// With `pinch` the thumb tip sits 0.01 from the index tip.
#[cfg(test)]
pub(crate) fn make_hand(extended: [bool; 4], pinch: bool) -> Vec<Landmark> {
    let mut lm = vec![Landmark::new(0.5, 0.7); LANDMARK_COUNT];
    lm[HandLandmark::Wrist.index()] = Landmark::new(0.5, 0.9);
    lm[HandLandmark::MiddleMcp.index()] = Landmark::new(0.5, 0.6);

    for (i, finger) in Finger::ALL.iter().enumerate() {
        let x = 0.40 + 0.08 * i as f32;
        lm[finger.pip().index()] = Landmark::new(x, 0.5);
        let tip_y = if extended[i] { 0.3 } else { 0.6 };
        lm[finger.tip().index()] = Landmark::new(x, tip_y);
    }

    lm[HandLandmark::ThumbTip.index()] = if pinch {
        let index_tip = lm[HandLandmark::IndexTip.index()];
        Landmark::new(index_tip.x + 0.01, index_tip.y)
    } else {
        Landmark::new(0.2, 0.7)
    };
    lm
}

// ── Tests ──────────────────────────────────────────────────

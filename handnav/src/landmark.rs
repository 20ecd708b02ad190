//! Hand landmark data structures.
//!
//! Models the 21-point hand layout produced by camera-based landmark
//! detectors.  Coordinates are normalized to the captured frame
//! (origin top-left, y grows downward).  A `Hand` may carry fewer than
//! 21 points when the detector returns a partial result; consumers
//! treat that as "nothing recognized" rather than an error.

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Fingers ────────────────────────────────────────────────

/// The four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All four fingers, index first.
    pub const ALL: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }

    /// Fingertip landmark.
    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Proximal interphalangeal joint landmark.
    pub fn pip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexPip,
            Self::Middle => HandLandmark::MiddlePip,
            Self::Ring => HandLandmark::RingPip,
            Self::Pinky => HandLandmark::PinkyPip,
        }
    }
}

// ── Points ─────────────────────────────────────────────────

/// A normalized 2D keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Landmark) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

// ── Hand ───────────────────────────────────────────────────

/// One detected hand: landmarks in `HandLandmark` order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Whether all 21 landmarks are present.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }

    /// Landmark by name, if the detector supplied it.
    pub fn get(&self, landmark: HandLandmark) -> Option<Landmark> {
        self.landmarks.get(landmark.index()).copied()
    }

    /// Distance between two landmarks on this hand.
    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> Option<f32> {
        Some(self.get(a)?.distance(&self.get(b)?))
    }

    /// Apparent palm size: wrist to middle-finger MCP.
    pub fn palm_size(&self) -> Option<f32> {
        self.distance(HandLandmark::Wrist, HandLandmark::MiddleMcp)
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One detection cycle: every hand the detector found.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub hands: Vec<Hand>,
    /// Capture time in milliseconds, when the producer reports one.
    pub timestamp_ms: Option<u64>,
}

impl Frame {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self {
            hands,
            timestamp_ms: None,
        }
    }

    /// A frame with no hands detected.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

// ── Test helpers ───────────────────────────────────────────

/// A complete hand with every landmark at `(x, y)`.
#[cfg(test)]
pub(crate) fn uniform_hand(x: f32, y: f32) -> Hand {
    Hand::new(vec![Landmark::new(x, y); LANDMARK_COUNT])
}

// ── Tests ──────────────────────────────────────────────────

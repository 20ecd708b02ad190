//! Landmark recordings: s-expression parsing and offline replay.
//!
//! One frame per line:
//!
//! ```text
//! ; comments and blank lines are skipped
//! (:t 0 :hands (((0.5 . 0.9) (0.45 . 0.85) ...)))
//! (:t 33 :hands ())
//! ```
//!
//! `:t` is the capture time in milliseconds and drives the replay clock;
//! `:hands` is a list of hands, each a list of `(x . y)` points (a
//! two-element list `(x y)` is accepted too).

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use lexpr::Value;
use tracing::{debug, warn};

use crate::clock::ManualClock;
use crate::dispatcher::{DispatchOutcome, DispatcherConfig};
use crate::landmark::{Frame, Hand, Landmark};
use crate::navigation::{Destination, RouteLog};
use crate::session::{InteractionMode, TrackingSession, VecSource};

// ── Parsing ────────────────────────────────────────────────

/// Look up `:key` in a property list.  Handles both `Value::Keyword`
/// and `Value::Symbol(":key")` spellings.
fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Elements of a proper list.  `()` and `nil` are empty.
fn list_items(value: &Value) -> anyhow::Result<Vec<&Value>> {
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Null | Value::Nil => return Ok(items),
            Value::Symbol(s) if s.as_ref() == "nil" => return Ok(items),
            other => return Err(anyhow!("expected a list, found {}", other)),
        }
    }
}

fn number(value: &Value) -> anyhow::Result<f32> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| anyhow!("number out of range: {}", n)),
        other => Err(anyhow!("expected a number, found {}", other)),
    }
}

fn parse_point(value: &Value) -> anyhow::Result<Landmark> {
    let Value::Cons(pair) = value else {
        return Err(anyhow!("expected (x . y), found {}", value));
    };
    let x = number(pair.car())?;
    let y = match pair.cdr() {
        Value::Cons(rest) => number(rest.car())?,
        other => number(other)?,
    };
    Ok(Landmark::new(x, y))
}

fn parse_hand(value: &Value) -> anyhow::Result<Hand> {
    let points = list_items(value)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| parse_point(v).with_context(|| format!("landmark {}", i)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Hand::new(points))
}

/// Parse one recorded frame.
pub fn parse_frame(line: &str) -> anyhow::Result<Frame> {
    let value = lexpr::from_str(line).map_err(|e| anyhow!("malformed s-expression: {}", e))?;

    let t = match plist_get(&value, "t") {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| anyhow!(":t must be a non-negative integer, found {}", n))?,
        Some(other) => return Err(anyhow!(":t must be a number, found {}", other)),
        None => return Err(anyhow!("missing :t")),
    };

    let hands = match plist_get(&value, "hands") {
        Some(v) => list_items(v)?
            .into_iter()
            .enumerate()
            .map(|(i, h)| parse_hand(h).with_context(|| format!("hand {}", i)))
            .collect::<anyhow::Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Frame::new(hands).with_timestamp(t))
}

/// Parse a whole recording.  Errors name the offending line.
pub fn parse_recording(text: &str) -> anyhow::Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let frame = parse_frame(line).with_context(|| format!("line {}", n + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Read and parse a recording file.
pub fn load_recording(path: &Path) -> anyhow::Result<Vec<Frame>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read recording {}", path.display()))?;
    let frames = parse_recording(&text)
        .with_context(|| format!("invalid recording {}", path.display()))?;
    debug!(frames = frames.len(), path = %path.display(), "recording loaded");
    Ok(frames)
}

/// Serialize a frame back to the recording format.  Coordinates use the
/// shortest text that reads back to the same `f32`, so parsing the output
/// gives an identical frame.
pub fn format_frame(frame: &Frame) -> String {
    let mut s = format!("(:t {} :hands (", frame.timestamp_ms.unwrap_or(0));
    for (i, hand) in frame.hands.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        s.push('(');
        for (j, p) in hand.landmarks.iter().enumerate() {
            if j > 0 {
                s.push(' ');
            }
            s.push_str(&format!("({:?} . {:?})", p.x, p.y));
        }
        s.push(')');
    }
    s.push_str("))");
    s
}

// ── Replay ─────────────────────────────────────────────────

/// Result of replaying a recording through a tracking session.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Frames fed to the session.
    pub frames: usize,
    /// Navigation commands with the frame time that triggered them.
    pub navigations: Vec<(u64, Destination)>,
    /// Final session status.
    pub status: String,
}

impl ReplayReport {
    pub fn destinations(&self) -> Vec<Destination> {
        self.navigations.iter().map(|(_, d)| *d).collect()
    }

    /// Generate s-expression summary.
    pub fn summary_sexp(&self) -> String {
        let navs: Vec<String> = self
            .navigations
            .iter()
            .map(|(t, d)| format!("(:t {} :to {})", t, d.as_str()))
            .collect();
        format!(
            "(:frames {} :navigations ({}) :session {})",
            self.frames,
            navs.join(" "),
            self.status,
        )
    }
}

/// Feed recorded frames through a camera-mode session, timed by each
/// frame's `:t`.
pub fn replay(frames: &[Frame], config: DispatcherConfig) -> anyhow::Result<ReplayReport> {
    let clock = ManualClock::new(0);
    let mut session =
        TrackingSession::with_clock(config, VecSource::default(), RouteLog::new(), clock.clone());
    session.set_mode(InteractionMode::Camera)?;

    let mut navigations = Vec::new();
    let mut last_t = 0;
    for frame in frames {
        let t = frame.timestamp_ms.unwrap_or(last_t);
        if t < last_t {
            warn!(t, last_t, "recording time went backwards");
        }
        clock.set(t);
        last_t = t;

        if let Some(DispatchOutcome::Dispatched(destination)) = session.on_frame(frame) {
            navigations.push((t, destination));
        }
    }

    Ok(ReplayReport {
        frames: frames.len(),
        navigations,
        status: session.status_sexp(),
    })
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{one_frame, two_frame, zero_frame};
    use crate::landmark::LANDMARK_COUNT;

    fn at(frame: Frame, t: u64) -> Frame {
        frame.with_timestamp(t)
    }

    #[test]
    fn test_parse_empty_hands() {
        let frame = parse_frame("(:t 33 :hands ())").unwrap();
        assert_eq!(frame.timestamp_ms, Some(33));
        assert!(frame.is_empty());

        let frame = parse_frame("(:t 34)").unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_parse_points() {
        let frame = parse_frame("(:t 0 :hands (((0.5 . 0.25) (0.1 0.2)) ((1 . 0))))").unwrap();
        assert_eq!(frame.hands.len(), 2);
        assert_eq!(frame.hands[0].landmarks.len(), 2);
        assert_eq!(frame.hands[0].landmarks[0], Landmark::new(0.5, 0.25));
        assert_eq!(frame.hands[0].landmarks[1], Landmark::new(0.1, 0.2));
        assert_eq!(frame.hands[1].landmarks[0], Landmark::new(1.0, 0.0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_frame("(:hands ())").is_err());
        assert!(parse_frame("(:t -5 :hands ())").is_err());
        assert!(parse_frame("(:t 0 :hands (((0.5 . foo))))").is_err());
        assert!(parse_frame("(:t 0 :hands (").is_err());
    }

    #[test]
    fn test_recording_error_names_line() {
        let text = "; header\n(:t 0 :hands ())\n\n(:t 10 :hands ((bad)))\n";
        let err = parse_recording(text).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("line 4"), "got {}", msg);
    }

    #[test]
    fn test_format_then_parse_full_hand() {
        let frame = at(zero_frame(), 120);
        let parsed = parse_frame(&format_frame(&frame)).unwrap();
        assert_eq!(parsed.timestamp_ms, Some(120));
        assert_eq!(parsed.hands.len(), 1);
        assert_eq!(parsed.hands[0].landmarks.len(), LANDMARK_COUNT);
        assert_eq!(
            crate::gesture::classify(&parsed.hands[0].landmarks),
            Some(crate::gesture::GestureLabel::Zero)
        );
    }

    #[test]
    fn test_format_keeps_full_precision() {
        let hand = Hand::new(vec![
            Landmark::new(0.123_456_79, 0.987_654_3),
            Landmark::new(1.0, 0.0),
            Landmark::new(0.000_1, 0.333_333_34),
        ]);
        let frame = Frame::new(vec![hand]).with_timestamp(7);
        let text = format_frame(&frame);
        assert!(text.contains("(1.0 . 0.0)"), "{}", text);

        let parsed = parse_frame(&text).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_replay_scenario() {
        let frames = vec![
            at(zero_frame(), 0),
            at(zero_frame(), 500),
            at(zero_frame(), 1200),
            at(Frame::empty(), 1300),
            at(one_frame(), 1310),
            at(two_frame(), 1320),
        ];
        let config = DispatcherConfig {
            cooldown_ms: 1000,
            ..DispatcherConfig::default()
        };
        let report = replay(&frames, config).unwrap();
        assert_eq!(report.frames, 6);
        assert_eq!(
            report.navigations,
            vec![
                (0, Destination::Dashboard),
                (1200, Destination::Dashboard),
                (1310, Destination::Theory),
                (1320, Destination::Practice),
            ]
        );
        assert!(report.status.contains(":gesture two"));
    }

    #[test]
    fn test_summary_sexp() {
        let report = ReplayReport {
            frames: 2,
            navigations: vec![(0, Destination::Theory)],
            status: "nil".to_string(),
        };
        assert_eq!(
            report.summary_sexp(),
            "(:frames 2 :navigations ((:t 0 :to theory)) :session nil)"
        );
        assert_eq!(report.destinations(), vec![Destination::Theory]);
    }
}

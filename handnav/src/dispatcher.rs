//! Debounced gesture dispatch.
//!
//! Wraps the classifier with a small state machine that turns per-frame
//! gesture labels into navigation commands:
//!
//! - IDLE → ARMED(g, t) on the first recognized gesture (dispatch)
//! - ARMED(g, t) stays put while `g` repeats inside the cooldown
//! - ARMED(g, t) → ARMED(g', t') on a different gesture (dispatch)
//! - ARMED(g, t) → ARMED(g, t') once the cooldown has elapsed (dispatch)
//!
//! The dispatcher is owned by one tracking session and fed frames in
//! arrival order from a single callback context; it holds no locks.
//! Faults inside a frame are logged and the frame is dropped, so a bad
//! frame never reaches the caller's pipeline.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::gesture::{ClassifierConfig, GestureLabel};
use crate::landmark::{Frame, Hand};
use crate::navigation::{Destination, NavigationSink};

// ── Hand selection ─────────────────────────────────────────

/// Which detected hand drives gesture decisions.  Only one hand is
/// ever consulted per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandSelection {
    /// The first hand the detector reports.
    #[default]
    First,
    /// The complete hand with the largest apparent palm (closest to the
    /// camera).  Ties go to the earlier hand.  Partial detections only win
    /// when no hand in the frame is complete.
    LargestPalm,
}

impl HandSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::LargestPalm => "largest-palm",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "first" => Ok(Self::First),
            "largest-palm" => Ok(Self::LargestPalm),
            other => Err(anyhow!(
                "unknown hand selection: {other} (expected first or largest-palm)"
            )),
        }
    }

    /// Pick the hand to classify, `None` for an empty frame.
    pub fn select<'a>(&self, hands: &'a [Hand]) -> Option<&'a Hand> {
        match self {
            Self::First => hands.first(),
            Self::LargestPalm => {
                let mut best: Option<(&Hand, f32)> = None;
                for hand in hands.iter().filter(|h| h.is_complete()) {
                    let size = hand
                        .palm_size()
                        .filter(|s| s.is_finite())
                        .unwrap_or(0.0);
                    match best {
                        Some((_, best_size)) if size <= best_size => {}
                        _ => best = Some((hand, size)),
                    }
                }
                best.map(|(hand, _)| hand).or_else(|| hands.first())
            }
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Dispatcher configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Minimum time (ms) before the same gesture may navigate again.
    pub cooldown_ms: u64,
    /// Hand selection policy for multi-hand frames.
    pub hand_selection: HandSelection,
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1500,
            hand_selection: HandSelection::First,
            classifier: ClassifierConfig::default(),
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Last accepted gesture and when it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceState {
    pub last_gesture: Option<GestureLabel>,
    /// Never decreases while the dispatcher lives.
    pub last_timestamp_ms: u64,
}

impl DebounceState {
    /// No gesture accepted yet.
    pub fn is_idle(&self) -> bool {
        self.last_gesture.is_none()
    }
}

/// What happened to one frame.  Informational; callers may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Frame had no hands.
    NoHand,
    /// Selected hand matched no gesture (or was incomplete).
    NoGesture,
    /// Same gesture inside the cooldown window.
    Suppressed(GestureLabel),
    /// Navigation command delivered.
    Dispatched(Destination),
    /// A fault while handling the frame; logged and discarded.
    Dropped,
}

// ── Dispatcher ─────────────────────────────────────────────

/// Turns classified frames into debounced navigation commands.
pub struct GestureDispatcher<N, C = SystemClock> {
    config: DispatcherConfig,
    state: DebounceState,
    sink: N,
    clock: C,
    dispatched: u64,
    suppressed: u64,
    dropped: u64,
}

impl<N: NavigationSink> GestureDispatcher<N, SystemClock> {
    /// Dispatcher timed by the wall clock.
    pub fn new(config: DispatcherConfig, sink: N) -> Self {
        Self::with_clock(config, sink, SystemClock)
    }
}

impl<N: NavigationSink, C: Clock> GestureDispatcher<N, C> {
    pub fn with_clock(config: DispatcherConfig, sink: N, clock: C) -> Self {
        debug!(
            cooldown_ms = config.cooldown_ms,
            hand_selection = config.hand_selection.as_str(),
            "gesture dispatcher created"
        );
        Self {
            config,
            state: DebounceState::default(),
            sink,
            clock,
            dispatched: 0,
            suppressed: 0,
            dropped: 0,
        }
    }

    /// Handle one detection cycle.  Never panics and never returns an
    /// error; navigation happens through the sink.
    ///
    /// A contained panic still runs the process panic hook before the
    /// `error!` record is written.  The default hook prints its own line to
    /// stderr; install [`install_panic_hook`] to keep both in `tracing`.
    pub fn on_frame(&mut self, frame: &Frame) -> DispatchOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process(frame))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                self.dropped += 1;
                error!(
                    reason = %panic_message(&*payload),
                    "gesture frame dropped after fault"
                );
                DispatchOutcome::Dropped
            }
        }
    }

    fn process(&mut self, frame: &Frame) -> DispatchOutcome {
        let Some(hand) = self.config.hand_selection.select(&frame.hands) else {
            return DispatchOutcome::NoHand;
        };
        let Some(gesture) = self.config.classifier.classify(&hand.landmarks) else {
            return DispatchOutcome::NoGesture;
        };

        // A wall clock stepping backwards must not move the state back
        let now = self.clock.now_ms().max(self.state.last_timestamp_ms);

        if self.state.last_gesture == Some(gesture)
            && now - self.state.last_timestamp_ms < self.config.cooldown_ms
        {
            self.suppressed += 1;
            return DispatchOutcome::Suppressed(gesture);
        }

        self.state.last_gesture = Some(gesture);
        self.state.last_timestamp_ms = now;

        let destination = gesture.destination();
        match self.sink.navigate(destination) {
            Ok(()) => {
                self.dispatched += 1;
                info!(
                    gesture = gesture.as_str(),
                    destination = destination.as_str(),
                    at_ms = now,
                    "gesture navigation"
                );
                DispatchOutcome::Dispatched(destination)
            }
            Err(e) => {
                self.dropped += 1;
                warn!(
                    gesture = gesture.as_str(),
                    destination = destination.as_str(),
                    "navigation failed: {:#}",
                    e
                );
                DispatchOutcome::Dropped
            }
        }
    }

    /// Forget the last gesture (back to IDLE).
    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    pub fn into_sink(self) -> N {
        self.sink
    }

    /// Tear down, handing back the sink and clock.
    pub fn into_parts(self) -> (N, C) {
        (self.sink, self.clock)
    }

    /// Navigation commands delivered so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatched
    }

    /// Frames suppressed by the cooldown.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Frames lost to sink errors or faults.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        let (phase, gesture) = match self.state.last_gesture {
            Some(g) => ("armed", g.as_str()),
            None => ("idle", "nil"),
        };
        format!(
            "(:state {} :gesture {} :last-ms {} :dispatched {} :suppressed {} :dropped {})",
            phase,
            gesture,
            self.state.last_timestamp_ms,
            self.dispatched,
            self.suppressed,
            self.dropped,
        )
    }

    /// Generate s-expression for the active configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:cooldown-ms {} :hand-selection {} :pinch-ratio {:.2} :min-palm-size {:.3})",
            self.config.cooldown_ms,
            self.config.hand_selection.as_str(),
            self.config.classifier.pinch_ratio,
            self.config.classifier.min_palm_size,
        )
    }
}

/// Replace the default panic hook with one that reports through `tracing`,
/// so a panic caught by [`GestureDispatcher::on_frame`] shows up as
/// structured records instead of a raw stderr line.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            reason = %panic_message(info.payload()),
            location = %location,
            "panic"
        );
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn gesture_frame(extended: [bool; 4], pinch: bool) -> Frame {
    Frame::new(vec![Hand::new(crate::gesture::make_hand(extended, pinch))])
}

#[cfg(test)]
pub(crate) fn zero_frame() -> Frame {
    gesture_frame([false; 4], true)
}

#[cfg(test)]
pub(crate) fn one_frame() -> Frame {
    gesture_frame([true, false, false, false], false)
}

#[cfg(test)]
pub(crate) fn two_frame() -> Frame {
    gesture_frame([true, true, false, false], false)
}

// ── Tests ──────────────────────────────────────────────────

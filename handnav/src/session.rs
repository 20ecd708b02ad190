//! Tracking session: interaction mode, landmark source and dispatcher lifetime.
//!
//! Gesture navigation is only live while the user has picked the camera
//! interaction mode.  Each start creates a fresh dispatcher (IDLE) and
//! each stop discards it, so no debounce state survives a restart.

use std::collections::VecDeque;

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::dispatcher::{DispatchOutcome, DispatcherConfig, GestureDispatcher};
use crate::landmark::Frame;
use crate::navigation::NavigationSink;

// ── Interaction mode ───────────────────────────────────────

/// User-selected interaction mode.  Only `Camera` enables gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Normal,
    Camera,
    Voice,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Camera => "camera",
            Self::Voice => "voice",
        }
    }

    /// Accepts the web client's preference values as well ("camara", "voz").
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "camera" | "camara" => Ok(Self::Camera),
            "voice" | "voz" => Ok(Self::Voice),
            other => Err(anyhow!("unknown interaction mode: {other}")),
        }
    }

    pub fn uses_gestures(&self) -> bool {
        matches!(self, Self::Camera)
    }
}

// ── Landmark source ────────────────────────────────────────

/// Producer of landmark frames (camera + detector pipeline).
pub trait LandmarkSource {
    /// Begin producing frames.
    fn start(&mut self) -> anyhow::Result<()>;
    /// Stop producing frames.  Must be safe to call when not started.
    fn stop(&mut self);
    /// Next resolved frame, if one is ready.
    fn poll_frame(&mut self) -> Option<Frame>;
}

/// In-memory frame queue.  Frames are only handed out while started.
#[derive(Debug, Default)]
pub struct VecSource {
    frames: VecDeque<Frame>,
    running: bool,
}

impl VecSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            running: false,
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl LandmarkSource for VecSource {
    fn start(&mut self) -> anyhow::Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn poll_frame(&mut self) -> Option<Frame> {
        if !self.running {
            return None;
        }
        self.frames.pop_front()
    }
}

// ── Session ────────────────────────────────────────────────

enum Tracking<N, C> {
    Stopped { sink: N, clock: C },
    Running(GestureDispatcher<N, C>),
}

/// Owns the interaction mode and the dispatcher for one user.
pub struct TrackingSession<S, N, C = SystemClock> {
    mode: InteractionMode,
    config: DispatcherConfig,
    source: S,
    /// Only `None` if a transition panicked halfway.
    tracking: Option<Tracking<N, C>>,
}

impl<S: LandmarkSource, N: NavigationSink> TrackingSession<S, N, SystemClock> {
    pub fn new(config: DispatcherConfig, source: S, sink: N) -> Self {
        Self::with_clock(config, source, sink, SystemClock)
    }
}

impl<S: LandmarkSource, N: NavigationSink, C: Clock> TrackingSession<S, N, C> {
    pub fn with_clock(config: DispatcherConfig, source: S, sink: N, clock: C) -> Self {
        Self {
            mode: InteractionMode::Normal,
            config,
            source,
            tracking: Some(Tracking::Stopped { sink, clock }),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switch interaction mode and bring tracking in line with it.
    /// Re-selecting the current mode re-syncs too, so `set_mode(Camera)`
    /// restarts a stopped camera session.  On a failed start the mode is
    /// left unchanged.
    pub fn set_mode(&mut self, mode: InteractionMode) -> anyhow::Result<()> {
        if mode.uses_gestures() {
            self.start_tracking()?;
        } else {
            self.stop();
        }
        if mode != self.mode {
            info!(from = self.mode.as_str(), to = mode.as_str(), "interaction mode changed");
            self.mode = mode;
        }
        Ok(())
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.tracking, Some(Tracking::Running(_)))
    }

    /// Start the source and arm a fresh dispatcher.  No-op when running.
    /// Only camera mode tracks; other modes refuse to start.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if !self.mode.uses_gestures() {
            return Err(anyhow!(
                "gesture tracking requires camera mode (current mode: {})",
                self.mode.as_str()
            ));
        }
        self.start_tracking()
    }

    fn start_tracking(&mut self) -> anyhow::Result<()> {
        if self.is_tracking() {
            return Ok(());
        }
        if self.tracking.is_none() {
            return Err(anyhow!("tracking session is poisoned"));
        }
        self.source
            .start()
            .context("failed to start landmark source")?;

        self.tracking = match self.tracking.take() {
            Some(Tracking::Stopped { sink, clock }) => Some(Tracking::Running(
                GestureDispatcher::with_clock(self.config.clone(), sink, clock),
            )),
            other => other,
        };
        debug!("gesture tracking started");
        Ok(())
    }

    /// Stop the source and discard the dispatcher.  No-op when stopped.
    pub fn stop(&mut self) {
        if !self.is_tracking() {
            return;
        }
        self.source.stop();
        self.tracking = match self.tracking.take() {
            Some(Tracking::Running(dispatcher)) => {
                debug!(status = %dispatcher.status_sexp(), "gesture tracking stopped");
                let (sink, clock) = dispatcher.into_parts();
                Some(Tracking::Stopped { sink, clock })
            }
            other => other,
        };
    }

    /// Drain every ready frame from the source, in arrival order.
    /// Returns the number of frames handled.
    pub fn pump(&mut self) -> usize {
        let Some(Tracking::Running(dispatcher)) = self.tracking.as_mut() else {
            return 0;
        };
        let mut handled = 0;
        while let Some(frame) = self.source.poll_frame() {
            dispatcher.on_frame(&frame);
            handled += 1;
        }
        handled
    }

    /// Push-style entry point for callback-driven sources.
    /// `None` when tracking is off and the frame was ignored.
    pub fn on_frame(&mut self, frame: &Frame) -> Option<DispatchOutcome> {
        match self.tracking.as_mut() {
            Some(Tracking::Running(dispatcher)) => Some(dispatcher.on_frame(frame)),
            _ => None,
        }
    }

    /// Active dispatcher, if tracking.
    pub fn dispatcher(&self) -> Option<&GestureDispatcher<N, C>> {
        match self.tracking.as_ref() {
            Some(Tracking::Running(dispatcher)) => Some(dispatcher),
            _ => None,
        }
    }

    pub fn sink(&self) -> Option<&N> {
        match self.tracking.as_ref()? {
            Tracking::Stopped { sink, .. } => Some(sink),
            Tracking::Running(dispatcher) => Some(dispatcher.sink()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        let dispatcher = self
            .dispatcher()
            .map(|d| d.status_sexp())
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:mode {} :tracking {} :dispatcher {})",
            self.mode.as_str(),
            if self.is_tracking() { "t" } else { "nil" },
            dispatcher,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatcher::{one_frame, two_frame, zero_frame};
    use crate::navigation::{Destination, RouteLog};

    type TestSession = TrackingSession<VecSource, RouteLog, ManualClock>;

    fn make_session() -> (TestSession, ManualClock) {
        let clock = ManualClock::new(0);
        let session = TrackingSession::with_clock(
            DispatcherConfig::default(),
            VecSource::default(),
            RouteLog::new(),
            clock.clone(),
        );
        (session, clock)
    }

    fn visited(session: &TestSession) -> Vec<Destination> {
        session.sink().map(|s| s.visited.clone()).unwrap_or_default()
    }

    struct FailingSource;

    impl LandmarkSource for FailingSource {
        fn start(&mut self) -> anyhow::Result<()> {
            Err(anyhow!("camera permission denied"))
        }
        fn stop(&mut self) {}
        fn poll_frame(&mut self) -> Option<Frame> {
            None
        }
    }

    #[test]
    fn test_new_session_stopped() {
        let (session, _clock) = make_session();
        assert_eq!(session.mode(), InteractionMode::Normal);
        assert!(!session.is_tracking());
        assert!(session.dispatcher().is_none());
    }

    #[test]
    fn test_normal_mode_ignores_frames() {
        let (mut session, _clock) = make_session();
        assert!(session.on_frame(&zero_frame()).is_none());
        session.source_mut().push(zero_frame());
        assert_eq!(session.pump(), 0);
        assert!(visited(&session).is_empty());
    }

    #[test]
    fn test_voice_mode_ignores_frames() {
        let (mut session, _clock) = make_session();
        session.set_mode(InteractionMode::Voice).unwrap();
        assert!(!session.is_tracking());
        assert!(session.on_frame(&one_frame()).is_none());
    }

    #[test]
    fn test_camera_mode_starts_tracking() {
        let (mut session, _clock) = make_session();
        session.set_mode(InteractionMode::Camera).unwrap();
        assert!(session.is_tracking());
        assert!(session.source().is_running());
        assert_eq!(
            session.on_frame(&two_frame()),
            Some(DispatchOutcome::Dispatched(Destination::Practice))
        );
    }

    #[test]
    fn test_pump_in_arrival_order() {
        let (mut session, clock) = make_session();
        session.set_mode(InteractionMode::Camera).unwrap();
        session.source_mut().push(zero_frame());
        session.source_mut().push(one_frame());
        session.source_mut().push(one_frame());
        session.source_mut().push(Frame::empty());
        clock.set(100);
        assert_eq!(session.pump(), 4);
        assert_eq!(session.source().pending(), 0);
        assert_eq!(visited(&session), vec![Destination::Dashboard, Destination::Theory]);
    }

    #[test]
    fn test_restart_resets_debounce() {
        let (mut session, _clock) = make_session();
        session.set_mode(InteractionMode::Camera).unwrap();
        session.on_frame(&zero_frame());
        assert_eq!(
            session.on_frame(&zero_frame()),
            Some(DispatchOutcome::Suppressed(crate::gesture::GestureLabel::Zero))
        );

        session.set_mode(InteractionMode::Normal).unwrap();
        assert!(!session.is_tracking());
        assert!(!session.source().is_running());

        session.set_mode(InteractionMode::Camera).unwrap();
        assert!(session.dispatcher().unwrap().state().is_idle());
        assert_eq!(
            session.on_frame(&zero_frame()),
            Some(DispatchOutcome::Dispatched(Destination::Dashboard))
        );
        // The sink outlives the dispatcher
        assert_eq!(visited(&session), vec![Destination::Dashboard, Destination::Dashboard]);
    }

    #[test]
    fn test_failed_start_keeps_mode() {
        let mut session = TrackingSession::with_clock(
            DispatcherConfig::default(),
            FailingSource,
            RouteLog::new(),
            ManualClock::new(0),
        );
        let err = session.set_mode(InteractionMode::Camera).unwrap_err();
        assert!(format!("{:#}", err).contains("camera permission denied"));
        assert_eq!(session.mode(), InteractionMode::Normal);
        assert!(!session.is_tracking());
    }

    #[test]
    fn test_start_stop_idempotent() {
        let (mut session, _clock) = make_session();
        session.stop();
        session.set_mode(InteractionMode::Camera).unwrap();
        session.start().unwrap();
        session.start().unwrap();
        assert!(session.is_tracking());
        session.stop();
        session.stop();
        assert!(!session.is_tracking());
        assert_eq!(session.mode(), InteractionMode::Camera);
    }

    #[test]
    fn test_start_refused_outside_camera_mode() {
        let (mut session, _clock) = make_session();
        let err = session.start().unwrap_err();
        assert!(err.to_string().contains("requires camera mode"), "{}", err);
        assert!(!session.is_tracking());
        assert!(!session.source().is_running());
        assert!(session.on_frame(&one_frame()).is_none());

        session.set_mode(InteractionMode::Voice).unwrap();
        assert!(session.start().is_err());
        assert!(session.on_frame(&one_frame()).is_none());
        assert!(visited(&session).is_empty());
    }

    #[test]
    fn test_same_mode_resyncs_tracking() {
        let (mut session, _clock) = make_session();
        session.set_mode(InteractionMode::Camera).unwrap();
        session.stop();
        assert!(!session.is_tracking());

        session.set_mode(InteractionMode::Camera).unwrap();
        assert!(session.is_tracking());
        assert_eq!(
            session.on_frame(&one_frame()),
            Some(DispatchOutcome::Dispatched(Destination::Theory))
        );

        session.set_mode(InteractionMode::Normal).unwrap();
        session.set_mode(InteractionMode::Normal).unwrap();
        assert!(!session.is_tracking());
        assert!(session.on_frame(&one_frame()).is_none());
        assert_eq!(visited(&session), vec![Destination::Theory]);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(InteractionMode::parse("camara").unwrap(), InteractionMode::Camera);
        assert_eq!(InteractionMode::parse("camera").unwrap(), InteractionMode::Camera);
        assert_eq!(InteractionMode::parse("voz").unwrap(), InteractionMode::Voice);
        assert_eq!(InteractionMode::parse("normal").unwrap(), InteractionMode::Normal);
        assert!(InteractionMode::parse("keyboard").is_err());
        assert!(InteractionMode::Camera.uses_gestures());
        assert!(!InteractionMode::Voice.uses_gestures());
    }

    #[test]
    fn test_status_sexp() {
        let (mut session, _clock) = make_session();
        assert_eq!(
            session.status_sexp(),
            "(:mode normal :tracking nil :dispatcher nil)"
        );
        session.set_mode(InteractionMode::Camera).unwrap();
        let sexp = session.status_sexp();
        assert!(sexp.contains(":mode camera :tracking t"));
        assert!(sexp.contains(":dispatcher (:state idle"));
    }
}

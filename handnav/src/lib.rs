//! handnav - hand-gesture navigation core
//!
//! Classifies per-frame hand landmarks into counting gestures and turns
//! them into debounced navigation commands for an external router.
//!
//! Provides:
//! - `landmark`: 21-point hand model and frames
//! - `gesture`: pure classifier (zero / one / two)
//! - `dispatcher`: cooldown state machine feeding a `NavigationSink`
//! - `session`: interaction mode gating and dispatcher lifetime
//! - `replay`: s-expression landmark recordings for offline runs

pub mod clock;
pub mod dispatcher;
pub mod gesture;
pub mod landmark;
pub mod navigation;
pub mod replay;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{
    DebounceState, DispatchOutcome, DispatcherConfig, GestureDispatcher, HandSelection,
};
pub use gesture::{classify, ClassifierConfig, GestureLabel};
pub use landmark::{Frame, Hand, HandLandmark, Landmark, LANDMARK_COUNT};
pub use navigation::{Destination, NavigationSink, RouteLog};
pub use session::{InteractionMode, LandmarkSource, TrackingSession, VecSource};

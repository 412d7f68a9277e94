//! Monitoring session: frame pump, sampling, and result reconciliation.
//!
//! `MonitorSession` is the single-threaded heart of the client. The caller
//! drives `tick()` at a fixed cadence; each tick pumps one frame, samples it
//! for analysis when the counter says so, drains finished analyses, and
//! reconciles them into overlay and status state. Network work never happens
//! on this thread.

pub mod overlay;
pub mod reconcile;
pub mod session;

pub use overlay::OverlayState;
pub use reconcile::ReconcileOutcome;
pub use session::{MonitorSession, SessionState};

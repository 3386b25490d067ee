//! Dashboard State - explicit application state and event reducer
//!
//! `reduce(State, Event) -> State` is the only way the dashboard state
//! changes. It is pure, so the run state machine can be tested without a
//! UI or a backend.
//!
//! ```text
//! IDLE --RunRequested--> STARTING --RunStarted--> STREAMING --ProgressComplete--> COMPLETE
//!                           |                        |                               |
//!                           |                   StreamFailed                  RunCompleted/RunFailed
//!                           |                        v                               v
//!                           |                     POLLING --ProgressComplete-->  COMPLETE
//!                           +--RunFailed--> IDLE                                   IDLE
//! ```

pub mod reducer;

pub use reducer::{reduce, DashboardState, Event, OverviewUpdate, RunPhase};

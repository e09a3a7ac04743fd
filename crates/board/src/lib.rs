//! Board composition layer: the `RequestBoard` view-model over a
//! `RequestStore`, plus the background sync loops and logging setup used by
//! the headless binary.

pub mod board;
pub mod sync;
pub mod telemetry;

pub use board::{BoardError, DeleteOutcome, RequestBoard};
pub use sync::{spawn_poller, spawn_rollover};

//! The console's panel controllers.
//!
//! Each controller owns its state slice and exposes small `begin_*` /
//! `settle_*` transitions, so the UI task can issue a request on one event
//! and apply its outcome on a later one. The `async` helpers on each
//! controller run one whole cycle inline.
pub mod analysis;
pub mod chat;
pub mod input;
pub mod interaction;
pub mod log_feed;
pub mod poller;
pub mod router;
pub mod upload;

#[cfg(test)]
pub mod testing;

pub use router::{View, ViewRouter};

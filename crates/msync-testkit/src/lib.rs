//! msync-testkit
//!
//! Deterministic fakes and fixtures for pipeline scenario tests. Nothing here
//! touches the network or the clock.

mod fakes;
mod fixtures;

pub use fakes::{FailingProber, FakeSubmitter, StaticProber};
pub use fixtures::{official_payload, smithery_payload, RecordBuilder};

//! Binary support library: event dispatch lives here so integration tests
//! can drive it without a terminal.

pub mod dispatch;

//! Warlight referee library.
//!
//! Exposes the map model, move resolution, bot transport, protocol codecs
//! and the match state machine for use by integration tests and the binary
//! entry point.

pub mod board;
pub mod bot;
pub mod moves;
pub mod protocol;
pub mod referee;
pub mod replay;
pub mod resolve;

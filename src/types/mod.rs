//! Protocol-independent message types.
//!
//! The session state machine works on these instead of the generated
//! ext_proc types; [`crate::server::convert`] maps between the two.

pub mod message;

pub use message::{BodyChunk, InboundMessage, OutboundMessage};

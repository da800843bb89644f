//! Observer-facing event types.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` so hosts can
//! forward them verbatim to a UI layer or a log sink.

pub mod events;

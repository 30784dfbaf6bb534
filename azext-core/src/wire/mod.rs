//! XML envelopes exchanged with the Service Management API.

pub mod envelope;

pub use envelope::*;

//! Tracking of asynchronous server-side operations.
//!
//! Mutating calls only return an [`crate::OperationId`]; the [`Poller`]
//! turns that id into a final outcome by querying the status endpoint until
//! the operation settles, the deadline passes or the caller cancels.

mod poller;

pub use poller::{OperationStatusSource, PollState, Poller};

//! Submission worker pool (§4.E): N cooperative workers draining the
//! priority queue and dispatching tasks over HTTP.

mod pool;
mod transport;

pub use pool::WorkerPool;
pub use transport::{HttpTransport, SubmitError, Transport};

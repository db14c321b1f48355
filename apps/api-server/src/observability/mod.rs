//! Observability - request ids.

mod request_id;

pub use request_id::RequestIdMiddleware;

//! JSON-lines request handling. Each request line is answered by exactly one
//! response line carrying the same `id`; failures use a stable error `code`.

mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};

mod envelope;
mod handlers;
mod helpers;
mod router;
mod types;

pub use envelope::unaddressed_err;
pub use router::handle_request;
pub use types::{AppState, Request};

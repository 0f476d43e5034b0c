//! LegalEase server: session state, HTTP routes, and the actions shared with
//! the command-line tool.

pub mod actions;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::{AppState, Session};

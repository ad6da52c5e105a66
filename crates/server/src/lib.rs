//! Boundary Server library: router assembly, state wiring, auth, and the
//! two ingress dialects. `main.rs` is a thin binary entry point over this.

pub mod auth;
pub mod error;
pub mod http;
pub mod ingress;
pub mod state;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

// Authentication module
// Provides JWT-based authentication with registration, login, token refresh
// and the middleware that guards protected routes

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use middleware::{require_auth, Actor, Identity};
pub use service::AuthService;
pub use token::{TokenPair, TokenService};

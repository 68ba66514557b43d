//! Authorization and session lifecycle.

mod auth;
mod core;
mod loopback;
mod manager;
mod secrets;
mod token;

pub use auth::OAuthAuthorizer;
pub use self::core::{Authorizer, Session};
pub use manager::SessionManager;
pub use secrets::ClientSecrets;
pub use token::{Token, TokenStore};

//! Cryptographic helpers for the OAuth flow.

pub mod pkce;

pub use pkce::{random_state, s256_challenge, PkcePair};

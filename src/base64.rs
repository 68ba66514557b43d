//! URL-safe base64 encoding without padding.
//!
//! OAuth PKCE verifiers, challenges and `state` values use the URL-safe
//! alphabet (`-` and `_` instead of `+` and `/`) with `=` padding removed.

use base64::{engine::general_purpose, Engine};

/// Encode bytes to URL-safe base64 (no padding).
///
/// # Example
/// ```
/// use drivepath::base64::base64url_encode;
/// let encoded = base64url_encode(b"hello");
/// assert!(!encoded.contains('='));
/// assert!(!encoded.contains('+'));
/// assert!(!encoded.contains('/'));
/// ```
pub fn base64url_encode(data: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(data)
}

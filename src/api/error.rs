//! Drive API error reasons.

use serde_json::Value;

use crate::error::DriveError;

/// Drive API error reasons, as reported in `error.errors[].reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorReason {
    /// Malformed request
    BadRequest,
    /// Invalid query or field value
    Invalid,
    /// Credentials invalid or expired
    AuthError,
    /// Scope does not cover the operation
    InsufficientPermissions,
    /// Daily limit exceeded
    DailyLimitExceeded,
    /// Project rate limit exceeded
    RateLimitExceeded,
    /// Per-user rate limit exceeded
    UserRateLimitExceeded,
    /// Sharing rate limit exceeded
    SharingRateLimitExceeded,
    /// Storage quota exhausted
    StorageQuotaExceeded,
    /// Node does not exist
    NotFound,
    /// Transient server error
    BackendError,
    /// Token endpoint rejected the grant
    InvalidGrant,
    /// Token endpoint rejected the client
    InvalidClient,
    /// Unknown reason
    Unknown,
}

impl From<&str> for ApiErrorReason {
    fn from(reason: &str) -> Self {
        match reason {
            "badRequest" => ApiErrorReason::BadRequest,
            "invalid" => ApiErrorReason::Invalid,
            "authError" => ApiErrorReason::AuthError,
            "insufficientPermissions" => ApiErrorReason::InsufficientPermissions,
            "dailyLimitExceeded" => ApiErrorReason::DailyLimitExceeded,
            "rateLimitExceeded" => ApiErrorReason::RateLimitExceeded,
            "userRateLimitExceeded" => ApiErrorReason::UserRateLimitExceeded,
            "sharingRateLimitExceeded" => ApiErrorReason::SharingRateLimitExceeded,
            "storageQuotaExceeded" => ApiErrorReason::StorageQuotaExceeded,
            "notFound" => ApiErrorReason::NotFound,
            "backendError" => ApiErrorReason::BackendError,
            "invalid_grant" => ApiErrorReason::InvalidGrant,
            "invalid_client" | "unauthorized_client" => ApiErrorReason::InvalidClient,
            _ => ApiErrorReason::Unknown,
        }
    }
}

impl ApiErrorReason {
    /// Get human-readable description of the reason.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorReason::BadRequest => "Bad request",
            ApiErrorReason::Invalid => "Invalid value",
            ApiErrorReason::AuthError => "Invalid credentials",
            ApiErrorReason::InsufficientPermissions => "Insufficient permissions",
            ApiErrorReason::DailyLimitExceeded => "Daily limit exceeded",
            ApiErrorReason::RateLimitExceeded => "Rate limit exceeded",
            ApiErrorReason::UserRateLimitExceeded => "User rate limit exceeded",
            ApiErrorReason::SharingRateLimitExceeded => "Sharing rate limit exceeded",
            ApiErrorReason::StorageQuotaExceeded => "Storage quota exceeded",
            ApiErrorReason::NotFound => "Resource does not exist",
            ApiErrorReason::BackendError => "Backend error",
            ApiErrorReason::InvalidGrant => "Authorization grant rejected",
            ApiErrorReason::InvalidClient => "Client credentials rejected",
            ApiErrorReason::Unknown => "Unknown error",
        }
    }

    /// Whether the request may succeed if sent again after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiErrorReason::RateLimitExceeded
                | ApiErrorReason::UserRateLimitExceeded
                | ApiErrorReason::BackendError
        )
    }
}

/// Whether a failed request is worth retrying.
pub(crate) fn is_retryable(err: &DriveError) -> bool {
    match err {
        DriveError::Api { status, reason, .. } => {
            *status == 429 || *status >= 500 || ApiErrorReason::from(reason.as_str()).is_retryable()
        }
        _ => false,
    }
}

/// Convert a non-success HTTP response body into a [`DriveError`].
///
/// Understands both the Drive shape
/// (`{"error":{"code":404,"message":"..","errors":[{"reason":"notFound"}]}}`)
/// and the OAuth token endpoint shape
/// (`{"error":"invalid_grant","error_description":".."}`).
pub(crate) fn error_from_body(status: u16, body: &str) -> DriveError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let (reason, message) = match error {
        Some(Value::String(code)) => {
            let message = parsed
                .as_ref()
                .and_then(|v| v.get("error_description"))
                .and_then(|v| v.as_str())
                .unwrap_or_else(|| ApiErrorReason::from(code.as_str()).description())
                .to_string();
            (code.clone(), message)
        }
        Some(obj) => {
            let reason = obj
                .get("errors")
                .and_then(|v| v.as_array())
                .and_then(|errors| errors.first())
                .and_then(|e| e.get("reason"))
                .and_then(|v| v.as_str())
                .or_else(|| obj.get("status").and_then(|v| v.as_str()))
                .unwrap_or("unknown")
                .to_string();
            let message = obj
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_else(|| ApiErrorReason::from(reason.as_str()).description())
                .to_string();
            (reason, message)
        }
        None => ("unknown".to_string(), body.trim().to_string()),
    };

    match (status, ApiErrorReason::from(reason.as_str())) {
        (404, _) | (_, ApiErrorReason::NotFound) => DriveError::NotFound(message),
        (401, _) | (_, ApiErrorReason::InvalidGrant) | (_, ApiErrorReason::InvalidClient) => {
            DriveError::Auth(format!("{}: {}", reason, message))
        }
        _ => DriveError::Api {
            status,
            reason,
            message,
        },
    }
}

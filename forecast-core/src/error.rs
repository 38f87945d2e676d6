use reqwest::StatusCode;
use thiserror::Error;

/// Failure modes of a fetch.
///
/// Every failure reaches the caller through a `Result` carrying one of
/// these variants; nothing is logged-and-swallowed. The `Display` text is
/// what consumers show the user, so each message stands on its own.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No HTTP response was obtained at all, e.g. a connection failure
    /// before any response line.
    #[error("missing HTTP response")]
    MissingResponse(#[source] reqwest::Error),

    /// A response arrived but its body could not be read; the underlying
    /// transport error is passed through verbatim.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The body was received but is not valid JSON (or not a JSON object);
    /// the decode error is passed through verbatim.
    #[error("failed to decode response body as JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered with a status other than 200. Carries a
    /// truncated body preview for diagnostics.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// The envelope decoded cleanly but the typed parse could not build
    /// the expected value (missing or mistyped fields).
    #[error("response JSON did not match the expected shape")]
    UnexpectedResponse,
}

impl ApiError {
    /// Build an `UnexpectedStatus` from the raw response parts, keeping a
    /// short body preview in the message.
    pub(crate) fn unexpected_status(status: StatusCode, body: &[u8]) -> Self {
        ApiError::UnexpectedStatus { status, body: body_preview(body) }
    }
}

/// First characters of the body, lossily decoded, for error messages.
fn body_preview(body: &[u8]) -> String {
    const MAX: usize = 200;

    if body.is_empty() {
        return "(empty body)".to_string();
    }

    let text = String::from_utf8_lossy(body);
    let preview: String = text.chars().take(MAX).collect();
    if text.chars().count() > MAX {
        format!("{preview}...")
    } else {
        preview
    }
}

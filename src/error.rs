use thiserror::Error;

/// Everything that can go wrong inside the scan pipeline.
///
/// All variants are recoverable: the loop logs them and returns to a stable
/// status rather than terminating.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No file was chosen, or the capture device has not produced a frame yet.
    #[error("no frame available from source")]
    NoFrameAvailable,

    /// Network unreachable, connection dropped, or the call exceeded the
    /// classify timeout.
    #[error("classifier transport failure: {0}")]
    Transport(String),

    /// The classifier answered with a non-success status.
    #[error("classifier returned status {status}")]
    Service { status: u16 },

    /// The response body was not the JSON shape we expect.
    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    /// A one-shot scan was requested while the pipeline was not idle.
    #[error("pipeline busy: {0}")]
    Busy(&'static str),
}

impl ScanError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        ScanError::MalformedResponse(detail.into())
    }
}

use thiserror::Error;

/// Errors a [`ResourceDetector`](crate::ResourceDetector) can report.
///
/// A failing detector never fails detection as a whole; its contribution is
/// replaced by an empty resource.
#[derive(Error, Debug)]
pub enum DetectError {
    /// The detector cannot run on this platform or in this environment.
    #[error("Resource detection is not supported: {0}")]
    Unsupported(&'static str),

    /// Reading the detector's data source failed.
    #[error("I/O error during resource detection: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource detection failed: {0}")]
    Other(String),
}

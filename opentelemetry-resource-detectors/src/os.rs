//! OS resource detector
//!
//! Detect the runtime operating system type.
use opentelemetry::KeyValue;
use opentelemetry_resource::{
    DetectError, DetectedResource, ResourceDetectionConfig, ResourceDetector,
};
use std::env::consts::OS;

/// Detect runtime operating system information.
///
/// This detector uses Rust's [`OS constant`] to detect the operating system type and
/// maps the result to the supported value defined in [`OpenTelemetry spec`].
///
/// [`OS constant`]: https://doc.rust-lang.org/std/env/consts/constant.OS.html
/// [`OpenTelemetry spec`]: https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/resource/semantic_conventions/os.md
#[derive(Debug, Default)]
pub struct OsResourceDetector;

impl ResourceDetector for OsResourceDetector {
    fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        Ok(DetectedResource::new().with_attribute(KeyValue::new(
            opentelemetry_semantic_conventions::attribute::OS_TYPE,
            os_type(OS),
        )))
    }
}

fn os_type(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        "dragonfly" => "dragonflybsd",
        "illumos" | "solaris" => "solaris",
        other => other,
    }
}

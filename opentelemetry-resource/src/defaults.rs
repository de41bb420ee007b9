//! Process-level defaults shared by the resources of one application.
use crate::detection::{ResourceDetectionConfig, ResourceDetector};
use crate::error::DetectError;
use crate::resource::{DetectedResource, Resource};
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    SERVICE_NAME, TELEMETRY_SDK_LANGUAGE, TELEMETRY_SDK_NAME, TELEMETRY_SDK_VERSION,
};
use std::env;
use std::sync::OnceLock;

const UNKNOWN_SERVICE: &str = "unknown_service";

/// Defaults that are computed once per process and handed to detection.
///
/// Create one at startup and pass it through
/// [`ResourceDetectionConfig::with_service_defaults`]. Tests can create
/// their own instance instead of sharing a global.
#[derive(Debug, Default)]
pub struct ServiceDefaults {
    service_name: OnceLock<String>,
}

impl ServiceDefaults {
    /// Defaults whose service name is derived from the running executable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with an explicit service name.
    pub fn with_service_name(name: impl Into<String>) -> Self {
        let service_name = OnceLock::new();
        let _ = service_name.set(name.into());
        ServiceDefaults { service_name }
    }

    /// The default `service.name`: `unknown_service:<executable>`, or
    /// `unknown_service` when the executable name is not available.
    pub fn service_name(&self) -> &str {
        self.service_name.get_or_init(|| {
            env::current_exe()
                .ok()
                .and_then(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
                .map(|executable| format!("{UNKNOWN_SERVICE}:{executable}"))
                .unwrap_or_else(|| UNKNOWN_SERVICE.to_owned())
        })
    }
}

fn default_detected(defaults: &ServiceDefaults) -> DetectedResource {
    DetectedResource::new().with_attributes([
        KeyValue::new(SERVICE_NAME, defaults.service_name().to_owned()),
        KeyValue::new(TELEMETRY_SDK_LANGUAGE, "rust"),
        KeyValue::new(TELEMETRY_SDK_NAME, "opentelemetry"),
        KeyValue::new(TELEMETRY_SDK_VERSION, env!("CARGO_PKG_VERSION")),
    ])
}

/// The resource every application starts from: the default service name and
/// the `telemetry.sdk.*` attributes.
pub fn default_resource(defaults: &ServiceDefaults) -> Resource {
    Resource::from_detected(default_detected(defaults))
}

/// Detects the [`default_resource`] from the config's [`ServiceDefaults`].
///
/// Place it first in the detector list so every other detector overrides it.
#[derive(Debug, Default)]
pub struct DefaultResourceDetector;

impl ResourceDetector for DefaultResourceDetector {
    fn detect(&self, config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        Ok(default_detected(config.service_defaults()))
    }
}

//! Running detectors and folding their results into one resource.
use crate::defaults::ServiceDefaults;
use crate::error::DetectError;
use crate::resource::{DetectedResource, Resource};
use opentelemetry::otel_debug;
use std::fmt;
use std::sync::Arc;

/// Produces attributes and entities for one source of information, such as
/// the host, the operating system or the current process.
///
/// `detect` returns synchronously. Values that need I/O to be known are
/// added as async attributes of the returned [`DetectedResource`].
pub trait ResourceDetector: Send + Sync {
    /// Detects the resource for this source.
    fn detect(&self, config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError>;

    /// A name identifying the detector in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A detector that detects nothing.
#[derive(Debug, Default)]
pub struct NoopResourceDetector;

impl ResourceDetector for NoopResourceDetector {
    fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        Ok(DetectedResource::new())
    }
}

/// Configuration for [`detect_resources`].
///
/// The config is passed to every detector, which can read the shared
/// [`ServiceDefaults`] from it.
#[derive(Default)]
pub struct ResourceDetectionConfig {
    detectors: Vec<Box<dyn ResourceDetector>>,
    service_defaults: Arc<ServiceDefaults>,
}

impl ResourceDetectionConfig {
    /// A config with no detectors and fresh service defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a detector. Later detectors take precedence.
    pub fn with_detector<D: ResourceDetector + 'static>(mut self, detector: D) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Appends detectors. Later detectors take precedence.
    pub fn with_detectors<I>(mut self, detectors: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ResourceDetector>>,
    {
        self.detectors.extend(detectors);
        self
    }

    /// Replaces the process defaults handed to detectors.
    pub fn with_service_defaults(mut self, service_defaults: Arc<ServiceDefaults>) -> Self {
        self.service_defaults = service_defaults;
        self
    }

    /// The detectors, in run order.
    pub fn detectors(&self) -> &[Box<dyn ResourceDetector>] {
        &self.detectors
    }

    /// The defaults passed to every detector.
    pub fn service_defaults(&self) -> &ServiceDefaults {
        &self.service_defaults
    }
}

impl fmt::Debug for ResourceDetectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDetectionConfig")
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("service_defaults", &self.service_defaults)
            .finish()
    }
}

/// Runs every configured detector and merges the results.
///
/// A detector that fails contributes an empty resource. Results are folded
/// in list order so that a later detector wins over an earlier one on
/// conflicting keys. Pending attributes are left pending; await
/// [`Resource::wait_for_async_attributes`] before reading settled values.
pub fn detect_resources(config: &ResourceDetectionConfig) -> Resource {
    config
        .detectors
        .iter()
        .map(|detector| match detector.detect(config) {
            Ok(detected) => Resource::from_detected(detected),
            Err(err) => {
                otel_debug!(
                    name: "ResourceDetector.Failed",
                    detector = detector.name(),
                    error = &err.to_string()
                );
                Resource::empty()
            }
        })
        .fold(Resource::empty(), |detected, resource| {
            resource.merge(&detected)
        })
}

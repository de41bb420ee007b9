//! Representations of entities producing telemetry.
//!
//! A [`Resource`] describes the process, host, container or cloud instance
//! that emits telemetry. It is assembled from independently detected pieces:
//!
//! - raw attributes, some of which may only be known after asynchronous
//!   detection ([`MaybePending`]);
//! - [`Entity`]s, typed groups of identifying and descriptive attributes.
//!
//! [`Resource::merge`] combines resources with the receiver taking
//! precedence, and [`Resource::attributes`] flattens everything into one
//! conflict-resolved map.
//!
//! # Detection
//!
//! [`ResourceDetector`]s produce [`DetectedResource`]s. [`detect_resources`]
//! runs them, isolates failures and folds the results so that later
//! detectors win.
//!
//! ```
//! use opentelemetry::{Key, KeyValue, Value};
//! use opentelemetry_resource::{
//!     detect_resources, DefaultResourceDetector, DetectError, DetectedResource,
//!     ResourceDetectionConfig, ResourceDetector,
//! };
//!
//! struct RegionDetector;
//!
//! impl ResourceDetector for RegionDetector {
//!     fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
//!         Ok(DetectedResource::new()
//!             .with_attribute(KeyValue::new("cloud.region", "eu-west-3"))
//!             .with_async_attribute("cloud.account.id", async {
//!                 Ok::<_, DetectError>(Value::from("123456789"))
//!             }))
//!     }
//! }
//!
//! let config = ResourceDetectionConfig::new()
//!     .with_detector(DefaultResourceDetector)
//!     .with_detector(RegionDetector);
//! let resource = detect_resources(&config);
//!
//! futures_executor::block_on(resource.wait_for_async_attributes());
//! assert_eq!(
//!     resource.get(&Key::new("cloud.account.id")),
//!     Some("123456789".into())
//! );
//! ```
//!
//! # Internal logs
//!
//! With the `internal-logs` feature (on by default) diagnostics are emitted
//! through `tracing`, e.g. when attributes are read before pending values
//! settled or when a detector fails.
#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

pub mod attribute;
mod defaults;
mod detection;
pub mod entity;
mod error;
mod resource;

pub use attribute::{MaybePending, PendingValue};
pub use defaults::{default_resource, DefaultResourceDetector, ServiceDefaults};
pub use detection::{
    detect_resources, NoopResourceDetector, ResourceDetectionConfig, ResourceDetector,
};
pub use entity::{merge_entities, DetectedEntity, Entity, EntityRef};
pub use error::DetectError;
pub use resource::{DetectedResource, Resource, ResourceBuilder};

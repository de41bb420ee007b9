//! Kubernetes resource detector
//!
//! Detect the pod this process runs in from environment variables populated
//! through the Kubernetes downward API. The namespace falls back to the one
//! mounted with the pod's service account.
use opentelemetry::KeyValue;
use opentelemetry_resource::{
    DetectError, DetectedEntity, DetectedResource, ResourceDetectionConfig, ResourceDetector,
};
use opentelemetry_semantic_conventions::attribute::{
    K8S_NAMESPACE_NAME, K8S_NODE_NAME, K8S_POD_NAME, K8S_POD_UID,
};
use std::env;
use std::io;

const K8S_POD_NAME_ENV_VAR: &str = "K8S_POD_NAME";
const K8S_POD_UID_ENV_VAR: &str = "K8S_POD_UID";
const K8S_NAMESPACE_NAME_ENV_VAR: &str = "K8S_NAMESPACE_NAME";
const K8S_NODE_NAME_ENV_VAR: &str = "K8S_NODE_NAME";
const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// The entity type of a Kubernetes pod.
pub const K8S_POD_ENTITY_TYPE: &str = "k8s.pod";

/// A resource detector for Kubernetes environment variables.
///
/// Produces a `k8s.pod` entity identified by the pod name and namespace (and
/// uid, when exposed), with the node name as a descriptive attribute. Outside
/// Kubernetes, i.e. when `K8S_POD_NAME` is not set, nothing is detected.
///
/// Without `K8S_NAMESPACE_NAME` the namespace is read from the service
/// account mount. A missing file leaves the namespace out; any other read
/// failure fails the detector with [`DetectError::Io`].
#[derive(Debug)]
pub struct K8sResourceDetector {
    namespace_detect: fn() -> io::Result<Option<String>>,
}

impl ResourceDetector for K8sResourceDetector {
    fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        let pod_name = env::var(K8S_POD_NAME_ENV_VAR).unwrap_or_default();
        if pod_name.is_empty() {
            return Ok(DetectedResource::new());
        }

        let namespace = match env::var(K8S_NAMESPACE_NAME_ENV_VAR) {
            Ok(namespace) => Some(namespace),
            Err(_) => (self.namespace_detect)()?,
        };
        let identifier = [
            Some(KeyValue::new(K8S_POD_NAME, pod_name)),
            namespace.map(|namespace| KeyValue::new(K8S_NAMESPACE_NAME, namespace)),
            env::var(K8S_POD_UID_ENV_VAR)
                .ok()
                .map(|uid| KeyValue::new(K8S_POD_UID, uid)),
        ];
        let attributes = env::var(K8S_NODE_NAME_ENV_VAR)
            .ok()
            .map(|node| KeyValue::new(K8S_NODE_NAME, node));

        Ok(DetectedResource::new().with_entity(
            DetectedEntity::new(K8S_POD_ENTITY_TYPE)
                .with_identifier(identifier.into_iter().flatten())
                .with_attributes(attributes),
        ))
    }
}

fn namespace_detect() -> io::Result<Option<String>> {
    match std::fs::read_to_string(SERVICE_ACCOUNT_NAMESPACE_PATH) {
        Ok(namespace) => Ok(Some(namespace.trim().to_owned()).filter(|ns| !ns.is_empty())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

impl Default for K8sResourceDetector {
    fn default() -> Self {
        Self { namespace_detect }
    }
}

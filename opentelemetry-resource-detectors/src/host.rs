//! HOST resource detector
//!
//! Detect the host architecture and the unique host ID.
use opentelemetry::{KeyValue, Value};
use opentelemetry_resource::{
    DetectError, DetectedResource, ResourceDetectionConfig, ResourceDetector,
};
use opentelemetry_semantic_conventions::attribute::{HOST_ARCH, HOST_ID};
use std::env::consts::ARCH;
use std::io;

/// Detect the host architecture and the unique host ID.
///
/// The host id is looked up using the sources defined in the OpenTelemetry
/// semantic conventions [`host.id from non-containerized systems`]. The
/// lookup runs as an async attribute, so `host.id` is only present once
/// [`Resource::wait_for_async_attributes`] has completed, and is left out
/// when no source is available.
///
/// [`host.id from non-containerized systems`]: https://opentelemetry.io/docs/specs/semconv/resource/host/#collecting-hostid-from-non-containerized-systems
/// [`Resource::wait_for_async_attributes`]: opentelemetry_resource::Resource::wait_for_async_attributes
#[derive(Debug)]
pub struct HostResourceDetector {
    host_id_detect: fn() -> io::Result<String>,
}

impl ResourceDetector for HostResourceDetector {
    fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        let host_id_detect = self.host_id_detect;
        Ok(DetectedResource::new()
            .with_attribute(KeyValue::new(HOST_ARCH, host_arch()))
            .with_async_attribute(HOST_ID, async move {
                host_id_detect().map(|host_id| Value::from(host_id.trim().to_owned()))
            }))
    }
}

// Maps Rust's architecture names to the values defined for `host.arch`.
fn host_arch() -> &'static str {
    match ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "x86",
        "arm" => "arm32",
        "powerpc" => "ppc32",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        other => other,
    }
}

#[cfg(target_os = "linux")]
fn host_id_detect() -> io::Result<String> {
    use std::fs::read_to_string;
    use std::path::Path;

    let machine_id_path = Path::new("/etc/machine-id");
    let dbus_machine_id_path = Path::new("/var/lib/dbus/machine-id");
    read_to_string(machine_id_path).or_else(|_| read_to_string(dbus_machine_id_path))
}

// TODO: Implement non-linux platforms (IOPlatformUUID on macOS, MachineGuid on Windows)
#[cfg(not(target_os = "linux"))]
fn host_id_detect() -> io::Result<String> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "host id detection is not implemented for this platform",
    ))
}

impl Default for HostResourceDetector {
    fn default() -> Self {
        Self { host_id_detect }
    }
}

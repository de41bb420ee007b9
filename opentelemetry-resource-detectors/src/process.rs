//! Process resource detector
//!
//! Detect process related information like pid, executable name.

use opentelemetry::{KeyValue, StringValue, Value};
use opentelemetry_resource::{
    DetectError, DetectedResource, ResourceDetectionConfig, ResourceDetector,
};
use std::env::{args_os, current_exe};
use std::process::id;

/// Detect process information.
///
/// This resource detector returns the following information:
///
/// - process command line arguments(`process.command_args`), the full command arguments of this
///   application.
/// - OS assigned process id(`process.pid`).
/// - process executable name(`process.executable.name`), when it can be determined.
/// - process runtime version(`process.runtime.version`).
/// - process runtime name(`process.runtime.name`).
/// - process runtime description(`process.runtime.description`).
#[derive(Debug, Default)]
pub struct ProcessResourceDetector;

impl ResourceDetector for ProcessResourceDetector {
    fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        let arguments = args_os();
        let cmd_arg_val = arguments
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned().into())
            .collect::<Vec<StringValue>>();
        let executable_name = current_exe().ok().and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        });

        Ok(DetectedResource::new().with_attributes(
            [
                Some(KeyValue::new(
                    opentelemetry_semantic_conventions::attribute::PROCESS_COMMAND_ARGS,
                    Value::Array(cmd_arg_val.into()),
                )),
                Some(KeyValue::new(
                    opentelemetry_semantic_conventions::attribute::PROCESS_PID,
                    id() as i64,
                )),
                executable_name.map(|name| {
                    KeyValue::new(
                        opentelemetry_semantic_conventions::attribute::PROCESS_EXECUTABLE_NAME,
                        name,
                    )
                }),
                Some(KeyValue::new(
                    opentelemetry_semantic_conventions::attribute::PROCESS_RUNTIME_NAME,
                    "rustc",
                )),
                // Set from build.rs
                option_env!("RUSTC_VERSION").map(|rustc_version| {
                    KeyValue::new(
                        opentelemetry_semantic_conventions::attribute::PROCESS_RUNTIME_VERSION,
                        rustc_version,
                    )
                }),
                // Set from build.rs
                option_env!("RUSTC_VERSION_DESCRIPTION").map(|rustc_version_desc| {
                    KeyValue::new(
                        opentelemetry_semantic_conventions::attribute::PROCESS_RUNTIME_DESCRIPTION,
                        rustc_version_desc,
                    )
                }),
            ]
            .into_iter()
            .flatten(),
        ))
    }
}

use std::env;
use std::process::Command;

// Exposes the compiler version to the process detector as
// RUSTC_VERSION (e.g. 1.76.0) and RUSTC_VERSION_DESCRIPTION (the full `rustc -V` line).
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RUSTC");

    let rustc = env::var_os("RUSTC").unwrap_or_else(|| "rustc".into());
    let Some(description) = Command::new(rustc)
        .arg("-V")
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok())
    else {
        return;
    };
    let description = description.trim();

    println!("cargo:rustc-env=RUSTC_VERSION_DESCRIPTION={description}");
    if let Some(version) = description.split_whitespace().nth(1) {
        println!("cargo:rustc-env=RUSTC_VERSION={version}");
    }
}

//! Build script for framediag.
//!
//! Points out feature combinations that make error reports less useful.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_BACKTRACE");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    let backtrace_enabled = env::var("CARGO_FEATURE_BACKTRACE").is_ok();
    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    // --- Stack traces ---
    if !backtrace_enabled {
        emit_warning("'backtrace' feature disabled: StdPlatform reports carry no call stack");
        emit_note("Provide your own Platform::capture_stack, or enable the feature:");
        emit_note("  framediag = { version = \"0.3\", features = [\"backtrace\"] }");
    }

    // --- Local diagnostics ---
    if is_release && !diagnostics_enabled && !log_enabled {
        emit_warning("release build without 'diagnostics' or 'log': FDxxx diagnostics are silent");
        emit_note("A full symbol cache or an unwritable crash log will go unnoticed.");
    }

    // --- Targets without a breakpoint instruction ---
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if !matches!(arch.as_str(), "x86" | "x86_64" | "aarch64") {
        emit_note(&format!(
            "no breakpoint instruction known for '{}'; StdPlatform::debug_break only prints",
            arch
        ));
    }
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[framediag]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[framediag] ⚠️  {}", msg);
}

use std::process::Command;

use anyhow::{Context, Result};

/// `blobmeter-common` feature tiers, each checked on its own.
const FEATURE_COMBINATIONS: &[&[&str]] = &[&[], &["foundation"], &["observability"], &["runtime"]];

const CRATE: &str = "blobmeter-common";

/// Check that every feature tier compiles in isolation.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} {CRATE} feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, features) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let label = if features.is_empty() { "none".to_string() } else { joined.clone() };

        let total = FEATURE_COMBINATIONS.len();
        println!("\n[{}/{total}] cargo check -p {CRATE} ({label})", index + 1);

        let mut command = Command::new("cargo");
        command.args(["check", "-p", CRATE, "--no-default-features"]);
        if !features.is_empty() {
            command.arg("--features").arg(&joined);
        }

        let status = command
            .status()
            .with_context(|| format!("Failed to run cargo check for '{label}'"))?;

        if !status.success() {
            anyhow::bail!("Feature combination '{label}' failed to compile");
        }

        println!("✅ Features '{label}' compiled successfully");
    }

    println!("\n✅ All {} feature combinations compile successfully!", FEATURE_COMBINATIONS.len());

    Ok(())
}

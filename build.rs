use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use footmouse_config::{generate, DeviceConfig};

/// JSON configuration used with feature `json-config` when no path is given
const DEFAULT_JSON_CONFIG: &str = "footmouse.json";
const JSON_CONFIG_VAR: &str = "FOOTMOUSE_JSON_CONFIG";

/// Linker memory layout of the target, only needed for the firmware binary
fn memory(out: &Path) -> Result<()> {
    if env::var_os("CARGO_FEATURE_FIRMWARE").is_none() {
        return Ok(());
    }
    fs::write(out.join("memory.x"), include_bytes!("memory.x"))
        .context("Saving memory.x")?;
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
    Ok(())
}

/// Path of the JSON device configuration, `None` if not used in this build
fn json_config_path() -> Result<Option<PathBuf>> {
    println!("cargo:rerun-if-env-changed={}", JSON_CONFIG_VAR);
    let var = env::var_os(JSON_CONFIG_VAR)
        .map(|s| s.into_string())
        .transpose()
        .map_err(|_| anyhow::anyhow!("{} is not utf-8", JSON_CONFIG_VAR))?;

    if env::var_os("CARGO_FEATURE_JSON_CONFIG").is_none() {
        if var.is_some() {
            println!("cargo:warning={} defined but ignored because feature \"json-config\" is not enabled",
                JSON_CONFIG_VAR);
        }
        return Ok(None);
    }

    let path = PathBuf::from(var.unwrap_or_else(|| DEFAULT_JSON_CONFIG.into()));
    println!("cargo:rerun-if-changed={}", path.display());
    Ok(Some(path))
}

fn main() -> Result<()> {
    built::write_built_file().context("Writing build metadata")?;

    let out = PathBuf::from(env::var_os("OUT_DIR").context("Could not get OUT_DIR")?);
    memory(&out)?;

    match json_config_path()? {
        Some(json) => generate(&json, &out)
            .with_context(|| format!("While generating config from {}", json.display()))?,
        None => DeviceConfig::schema_to_file(&out.join("schema.json"))
            .context("While generating JSON schema")?,
    }
    Ok(())
}

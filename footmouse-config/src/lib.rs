//! JSON configuration of the foot pedal firmware
//!
//! The build script reads the configuration and turns it into Rust code that
//! defines the device defaults as constants.

pub mod format;
pub mod pedal;

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use proc_macro2::TokenStream;
use quote::{quote, ToTokens, TokenStreamExt};
use schemars::{schema_for, JsonSchema};
use serde::{Serialize, Deserialize};

pub use pedal::{PedalConfig, PedalMode};

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Pedals in the order of their inputs on the board
    pub pedals: Vec<PedalConfig>,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub keep_awake: KeepAwakeConfig,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Reject frames with invalid CRC-32, otherwise they are only reported
    pub strict_crc: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self { strict_crc: true }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct KeepAwakeConfig {
    /// Time between synthetic key taps in milliseconds
    pub period_ms: u32,
    pub enabled_at_boot: bool,
}

impl Default for KeepAwakeConfig {
    fn default() -> Self {
        Self { period_ms: 60_000, enabled_at_boot: false }
    }
}

impl DeviceConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.pedals.is_empty(), "At least one pedal must be configured");
        ensure!(self.keep_awake.period_ms > 0, "Keep-awake period must not be zero");
        ensure!(self.keep_awake.period_ms.checked_mul(1000).is_some(),
            "Keep-awake period of {} ms does not fit the microsecond timer", self.keep_awake.period_ms);
        Ok(())
    }

    /// Generate Rust code defining `N_PEDALS` and `CONFIG`
    pub fn to_code(&self) -> Result<String> {
        format::format_file(self.to_token_stream())
            .context("Generated code is not valid Rust")
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_code()?)?;
        Ok(())
    }

    pub fn schema() -> Result<String> {
        let schema = schema_for!(DeviceConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    pub fn schema_to_file(path: &Path) -> Result<()> {
        fs::write(path, Self::schema()?)?;
        Ok(())
    }
}

/// Read JSON configuration and write `config.rs` and `schema.json` to `out_dir`
///
/// Nothing is written outside of `out_dir`.
pub fn generate(json: &Path, out_dir: &Path) -> Result<()> {
    let config = DeviceConfig::from_file(json)
        .with_context(|| format!("While reading {}", json.display()))?;
    config.to_file(&out_dir.join("config.rs"))
        .context("While generating config.rs")?;
    DeviceConfig::schema_to_file(&out_dir.join("schema.json"))
        .context("While generating JSON schema")
}

impl ToTokens for DeviceConfig {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let n_pedals = self.pedals.len();
        let pedals = &self.pedals;
        let strict_crc = self.protocol.strict_crc;
        let KeepAwakeConfig { period_ms, enabled_at_boot } = &self.keep_awake;
        tokens.append_all(quote! {
            pub const N_PEDALS: usize = #n_pedals;

            pub static CONFIG: crate::config::DeviceConfig<N_PEDALS> = crate::config::DeviceConfig {
                pedals: [ #( #pedals ),* ],
                protocol: crate::config::ProtocolConfig {
                    strict_crc: #strict_crc,
                },
                keep_awake: crate::config::KeepAwakeConfig {
                    period_ms: #period_ms,
                    enabled_at_boot: #enabled_at_boot,
                },
            };
        })
    }
}

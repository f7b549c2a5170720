use std::path::Path;

use anyhow::Context;
use gitdag_push::PushOptions;
use serde::{Deserialize, Serialize};

/// Contents of the `--config` file.
///
/// ```toml
/// [push]
/// concurrency = 64
/// progress_interval = 1000
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitdagConfig {
    pub push: PushOptions,
}

impl GitdagConfig {
    /// Read `path`, or the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

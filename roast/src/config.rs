use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs::File, io::Read};

use serde::Deserialize;

use crate::args::Opt;
use crate::sampler::SamplerConfig;

pub const DEFAULT_CONFIG: &str = "Roast.toml";

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RoastConfig {
    pub sampling: Sampling,
    pub server: Server,
    pub mappings: Mappings,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Sampling {
    pub interval_ms: u64,
    pub timeout_secs: Option<u64>,
    pub thread: Option<String>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            timeout_secs: None,
            thread: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 23000,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Mappings {
    pub dir: Option<PathBuf>,
}

impl RoastConfig {
    /// Read `path`, or `Roast.toml` from the current dir if it exists, and
    /// apply the command line on top.
    pub fn new(opt: &Opt) -> Result<Self> {
        let mut config = match &opt.config {
            Some(path) => Self::from_path(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => Self::from_path(DEFAULT_CONFIG)?,
            None => Self::default(),
        };
        config.apply(opt);
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let current_dir = std::env::current_dir().context("unable to get current dir")?;
        let mut config_file = File::open(path)
            .with_context(|| format!("{path:?} not found in {current_dir:?}"))?;
        let mut contents = String::new();
        config_file
            .read_to_string(&mut contents)
            .with_context(|| format!("something went wrong reading {path:?}"))?;
        let config: RoastConfig =
            toml::from_str(&contents).with_context(|| format!("invalid config {path:?}"))?;
        Ok(config)
    }

    pub fn apply(&mut self, opt: &Opt) {
        if let Some(interval) = opt.interval {
            self.sampling.interval_ms = interval;
        }
        if opt.timeout.is_some() {
            self.sampling.timeout_secs = opt.timeout;
        }
        if opt.thread.is_some() {
            self.sampling.thread = opt.thread.clone();
        }
        if let Some(host) = &opt.bind {
            self.server.host = host.clone();
        }
        if let Some(port) = opt.port {
            self.server.port = port;
        }
        if opt.mappings.is_some() {
            self.mappings.dir = opt.mappings.clone();
        }
    }

    /// sampler settings for a session starting at `now`; a zero timeout means none
    pub fn sampler_config(&self, now: SystemTime) -> SamplerConfig {
        SamplerConfig {
            interval_ms: self.sampling.interval_ms,
            end_time: self
                .sampling
                .timeout_secs
                .filter(|t| *t > 0)
                .map(|t| now + Duration::from_secs(t)),
            thread_filter: self.sampling.thread.clone(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

//! Ambient settings, backed by JSON and loaded explicitly
//! (`Config::from_file`) rather than relative to the running executable,
//! since pfdf-rs is a library, not a CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::errors::Result;

/// Settings that influence verbosity, thread usage and acquisition timeouts
/// across the workspace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub verbose: bool,
    /// <= 0 means "use all available cores".
    pub max_procs: isize,
    pub compress_rasters: bool,
    #[serde(with = "duration_secs")]
    pub http_head_timeout: Option<Duration>,
    #[serde(with = "duration_secs")]
    pub fetch_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            verbose: false,
            max_procs: -1,
            compress_rasters: true,
            http_head_timeout: Some(Duration::from_secs(10)),
            fetch_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| crate::errors::Error::InvalidJson(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::errors::Error::InvalidJson(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolves the effective worker count: `max_procs <= 0` means "use
    /// every available core".
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if self.max_procs > 0 && (self.max_procs as usize) < available {
            self.max_procs as usize
        } else {
            available
        }
    }
}

/// A `Fn(percent: usize)` progress sink. Kernels call this only when the
/// percentage has changed since the last call.
pub type ProgressFn<'a> = dyn FnMut(usize) + 'a;

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_secs_f64()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sets_head_and_fetch_timeouts() {
        let cfg = Config::default();
        assert_eq!(cfg.http_head_timeout, Some(Duration::from_secs(10)));
        assert_eq!(cfg.fetch_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn worker_count_respects_max_procs() {
        let mut cfg = Config::default();
        cfg.max_procs = 1;
        assert_eq!(cfg.worker_count(), 1);
    }
}

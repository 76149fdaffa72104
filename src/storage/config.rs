use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::base::Logger;
use crate::{Corrupting, from_io_result, Result, Status};

const BYTES_SIZE_FACTOR: u64 = 1024;
pub const KB: u64 = 1024;
pub const MB: u64 = KB * BYTES_SIZE_FACTOR;

pub const DEFAULT_CONFIGURATION_NAME: &str = "default";
pub const DEFAULT_GUIDEPOST_WIDTH_BYTES: u64 = 100 * MB;
pub const DEFAULT_STATS_POOL_SIZE: usize = 5;
pub const DEFAULT_STATS_POOL_KEEP_ALIVE_SECS: u64 = 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsOptions {
    /// Identity the run tracker is scoped by.
    pub name: String,
    pub commit_stats_async: bool,
    pub stats_collection_enabled: bool,
    pub guidepost_width_bytes: u64,
    pub stats_pool_size: usize,
    pub stats_pool_keep_alive_secs: u64,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONFIGURATION_NAME.to_string(),
            commit_stats_async: false,
            stats_collection_enabled: true,
            guidepost_width_bytes: DEFAULT_GUIDEPOST_WIDTH_BYTES,
            stats_pool_size: DEFAULT_STATS_POOL_SIZE,
            stats_pool_keep_alive_secs: DEFAULT_STATS_POOL_KEEP_ALIVE_SECS,
        }
    }
}

impl StatsOptions {
    pub fn with() -> StatsOptionsBuilder {
        StatsOptionsBuilder { opts: Self::default() }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        match serde_yaml::from_str::<Self>(yaml) {
            Ok(opts) => opts.validate(),
            Err(e) => Err(Status::corrupted(format!("Parse yaml fail: {}", e)))
        }
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = from_io_result(std::fs::read_to_string(path))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Status::corrupted(e.to_string()))
    }

    pub fn stats_pool_keep_alive(&self) -> Duration {
        Duration::from_secs(self.stats_pool_keep_alive_secs)
    }

    fn validate(self) -> Result<Self> {
        if self.stats_pool_size == 0 {
            return Err(Status::corrupted("stats_pool_size must be greater than zero"));
        }
        if self.name.is_empty() {
            return Err(Status::corrupted("configuration name must not be empty"));
        }
        Ok(self)
    }
}

pub struct StatsOptionsBuilder {
    opts: StatsOptions,
}

impl StatsOptionsBuilder {
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.opts.name = name.to_string();
        self
    }

    pub fn commit_stats_async(&mut self, opt: bool) -> &mut Self {
        self.opts.commit_stats_async = opt;
        self
    }

    pub fn stats_collection_enabled(&mut self, opt: bool) -> &mut Self {
        self.opts.stats_collection_enabled = opt;
        self
    }

    pub fn guidepost_width_bytes(&mut self, width: u64) -> &mut Self {
        self.opts.guidepost_width_bytes = width;
        self
    }

    pub fn stats_pool_size(&mut self, size: usize) -> &mut Self {
        self.opts.stats_pool_size = size.max(1);
        self
    }

    pub fn stats_pool_keep_alive_secs(&mut self, secs: u64) -> &mut Self {
        self.opts.stats_pool_keep_alive_secs = secs;
        self
    }

    pub fn build(&self) -> StatsOptions { self.opts.clone() }
}

/// Process configuration shared by every collection cycle.
///
/// The commit mode lives in an atomic: it may be flipped at runtime and is read
/// again by every scanner close.
pub struct Configuration {
    options: StatsOptions,
    commit_stats_async: AtomicBool,
    pub logger: Arc<dyn Logger>,
}

impl Configuration {
    pub fn new(options: StatsOptions, logger: Arc<dyn Logger>) -> Arc<Self> {
        Arc::new(Self {
            commit_stats_async: AtomicBool::new(options.commit_stats_async),
            options,
            logger,
        })
    }

    pub fn options(&self) -> &StatsOptions {
        &self.options
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn commit_stats_async(&self) -> bool {
        self.commit_stats_async.load(Ordering::Acquire)
    }

    pub fn set_commit_stats_async(&self, value: bool) {
        self.commit_stats_async.store(value, Ordering::Release)
    }
}

#[cfg(test)]
mod tests {
    use crate::base::BlackHoleLogger;

    use super::*;

    #[test]
    fn defaults() {
        let opts = StatsOptions::default();
        assert_eq!("default", opts.name);
        assert!(!opts.commit_stats_async);
        assert!(opts.stats_collection_enabled);
        assert_eq!(100 * 1024 * 1024, opts.guidepost_width_bytes);
        assert_eq!(5, opts.stats_pool_size);
        assert_eq!(Duration::from_secs(60), opts.stats_pool_keep_alive());
    }

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let opts = StatsOptions::from_yaml_str("commit_stats_async: true\nguidepost_width_bytes: 4096\n")?;
        assert!(opts.commit_stats_async);
        assert_eq!(4096, opts.guidepost_width_bytes);
        assert_eq!(5, opts.stats_pool_size);
        Ok(())
    }

    #[test]
    fn yaml_roundtrip_through_file() -> Result<()> {
        let opts = StatsOptions::with()
            .name("tenant-a")
            .commit_stats_async(true)
            .stats_pool_size(3)
            .build();
        let path = std::env::temp_dir().join(format!("mai2-stats-{}.yaml", std::process::id()));
        from_io_result(std::fs::write(&path, opts.to_yaml_string()?))?;
        let loaded = StatsOptions::from_yaml_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(opts, loaded?);
        Ok(())
    }

    #[test]
    fn bad_yaml() {
        assert!(StatsOptions::from_yaml_str("stats_pool_size: [1, 2]").unwrap_err().is_corruption());
        assert!(StatsOptions::from_yaml_str("stats_pool_size: 0").is_err());
        assert!(StatsOptions::from_yaml_file(Path::new("/no/such/file.yaml")).unwrap_err().is_io_error());
    }

    #[test]
    fn commit_mode_is_runtime_mutable() {
        let conf = Configuration::new(StatsOptions::default(), Arc::new(BlackHoleLogger));
        assert!(!conf.commit_stats_async());
        conf.set_commit_stats_async(true);
        assert!(conf.commit_stats_async());
        assert!(!conf.options().commit_stats_async);
    }
}

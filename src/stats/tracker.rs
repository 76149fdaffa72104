use std::sync::{Arc, RwLock};

use dashmap::{DashMap, DashSet};
use rusty_pool::{JoinHandle, ThreadPool};

use crate::base::Logger;
use crate::storage::{Configuration, RegionInfo};
use crate::{log_debug, log_info, Result};

/// Regions with statistics collection in flight, plus the pool deferred commits run on.
pub struct RunTracker {
    name: String,
    logger: Arc<dyn Logger>,
    compacting_regions: DashSet<Vec<u8>>,
    update_stats_command_regions: DashSet<Vec<u8>>,
    pool: RwLock<Option<ThreadPool>>,
}

impl RunTracker {
    pub fn new(config: &Configuration) -> Arc<Self> {
        let options = config.options();
        let pool = rusty_pool::Builder::new()
            .name(format!("stats-commit-{}", options.name))
            .core_size(1)
            .max_size(options.stats_pool_size.max(1))
            .keep_alive(options.stats_pool_keep_alive())
            .build();
        Arc::new(Self {
            name: options.name.clone(),
            logger: config.logger.clone(),
            compacting_regions: DashSet::new(),
            update_stats_command_regions: DashSet::new(),
            pool: RwLock::new(Some(pool)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns false if the region was already registered.
    pub fn add_compacting_region(&self, region: &RegionInfo) -> bool {
        self.compacting_regions.insert(region.region_name().to_vec())
    }

    /// Returns false if the region was not registered.
    pub fn remove_compacting_region(&self, region: &RegionInfo) -> bool {
        self.compacting_regions.remove(region.region_name()).is_some()
    }

    pub fn are_stats_being_collected_on_compaction(&self, region: &RegionInfo) -> bool {
        self.compacting_regions.contains(region.region_name())
    }

    pub fn add_update_stats_command_region(&self, region: &RegionInfo) -> bool {
        self.update_stats_command_regions.insert(region.region_name().to_vec())
    }

    pub fn remove_update_stats_command_region(&self, region: &RegionInfo) -> bool {
        self.update_stats_command_regions.remove(region.region_name()).is_some()
    }

    pub fn are_stats_being_collected_via_command(&self, region: &RegionInfo) -> bool {
        self.update_stats_command_regions.contains(region.region_name())
    }

    pub fn compacting_regions_count(&self) -> usize {
        self.compacting_regions.len()
    }

    /// Queues `task` on the worker pool and returns at once.
    ///
    /// The task is handed back when the tracker has been shut down.
    pub fn run_task<F>(&self, task: F) -> std::result::Result<JoinHandle<Result<()>>, F>
        where F: FnOnce() -> Result<()> + Send + 'static {
        let pool = match self.pool.read() {
            Ok(pool) => pool,
            Err(_) => return Err(task),
        };
        match pool.as_ref() {
            Some(pool) => Ok(pool.evaluate(task)),
            None => Err(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.pool.read().map(|x| x.is_some()).unwrap_or(false)
    }

    /// Blocks until every queued task has finished.
    pub fn join(&self) {
        let pool = self.pool.read().ok().and_then(|x| x.clone());
        if let Some(pool) = pool {
            pool.join();
        }
    }

    /// Stops accepting tasks and waits for the queued ones.
    pub fn shutdown(&self) {
        let pool = self.pool.write().ok().and_then(|mut x| x.take());
        if let Some(pool) = pool {
            log_info!(self.logger, "shutting down statistics run tracker {}", self.name);
            pool.shutdown_join();
        }
    }
}

/// Run trackers keyed by configuration name, so independent configurations
/// embedded in one process do not share regions or pools.
#[derive(Default)]
pub struct RunTrackerRegistry {
    trackers: DashMap<String, Arc<RunTracker>>,
}

impl RunTrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_instance(&self, config: &Configuration) -> Arc<RunTracker> {
        self.trackers.entry(config.name().to_string())
            .or_insert_with(|| {
                log_debug!(config.logger, "new statistics run tracker {}", config.name());
                RunTracker::new(config)
            })
            .clone()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<RunTracker>> {
        self.trackers.remove(name).map(|(_, tracker)| tracker)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn shutdown_all(&self) {
        let trackers: Vec<Arc<RunTracker>> = self.trackers.iter().map(|x| x.value().clone()).collect();
        self.trackers.clear();
        for tracker in trackers {
            tracker.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use crate::base::BlackHoleLogger;
    use crate::storage::StatsOptions;
    use crate::Status;

    use super::*;

    fn config(name: &str) -> Arc<Configuration> {
        Configuration::new(StatsOptions::with().name(name).stats_pool_size(2).build(),
                           Arc::new(BlackHoleLogger))
    }

    #[test]
    fn compacting_region_membership() {
        let tracker = RunTracker::new(&config("t"));
        let region = RegionInfo::new("t1", b"", b"", 1);
        assert!(tracker.add_compacting_region(&region));
        assert!(!tracker.add_compacting_region(&region));
        assert!(tracker.are_stats_being_collected_on_compaction(&region));
        assert!(!tracker.are_stats_being_collected_via_command(&region));

        assert!(tracker.remove_compacting_region(&region));
        assert!(!tracker.remove_compacting_region(&region));
        assert!(!tracker.are_stats_being_collected_on_compaction(&region));
        tracker.shutdown();
    }

    #[test]
    fn command_regions_are_separate() {
        let tracker = RunTracker::new(&config("t"));
        let region = RegionInfo::new("t1", b"", b"", 1);
        assert!(tracker.add_update_stats_command_region(&region));
        assert!(tracker.are_stats_being_collected_via_command(&region));
        assert!(!tracker.are_stats_being_collected_on_compaction(&region));
        assert!(tracker.remove_update_stats_command_region(&region));
        assert!(!tracker.remove_update_stats_command_region(&region));
        tracker.shutdown();
    }

    #[test]
    fn concurrent_add_and_remove() {
        let tracker = RunTracker::new(&config("t"));
        let handles: Vec<_> = (0..8u64).map(|i| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for j in 0..100u64 {
                    let region = RegionInfo::new("t1", b"", b"", i * 1000 + j);
                    assert!(tracker.add_compacting_region(&region));
                    assert!(tracker.remove_compacting_region(&region));
                }
            })
        }).collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(0, tracker.compacting_regions_count());
        tracker.shutdown();
    }

    #[test]
    fn tasks_run_on_pool() {
        let tracker = RunTracker::new(&config("t"));
        let counter = Arc::new(AtomicUsize::new(0));
        let caller = thread::current().id();
        for _ in 0..10 {
            let counter = counter.clone();
            let handle = tracker.run_task(move || {
                assert_ne!(caller, thread::current().id());
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            assert!(handle.is_ok());
        }
        tracker.join();
        assert_eq!(10, counter.load(Ordering::SeqCst));

        let handle = tracker.run_task(|| Err(Status::NotFound)).ok().unwrap();
        assert_eq!(Err(Status::NotFound), handle.await_complete());
        tracker.shutdown();
    }

    #[test]
    fn shut_down_tracker_hands_task_back() {
        let tracker = RunTracker::new(&config("t"));
        tracker.shutdown();
        assert!(!tracker.is_running());
        let rejected = tracker.run_task(|| Ok(()));
        let task = rejected.err().unwrap();
        assert_eq!(Ok(()), task());
    }

    #[test]
    fn registry_scopes_by_configuration_name() {
        let registry = RunTrackerRegistry::new();
        let a = registry.get_instance(&config("a"));
        let a2 = registry.get_instance(&config("a"));
        let b = registry.get_instance(&config("b"));
        assert!(Arc::ptr_eq(&a, &a2));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(2, registry.len());

        let region = RegionInfo::new("t1", b"", b"", 1);
        a.add_compacting_region(&region);
        assert!(!b.are_stats_being_collected_on_compaction(&region));

        assert!(registry.remove("b").is_some());
        registry.shutdown_all();
        assert!(registry.is_empty());
        assert!(!a.is_running());
        b.shutdown();
    }
}

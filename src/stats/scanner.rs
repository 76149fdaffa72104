use std::sync::Arc;

use crate::base::{CloseStack, Logger};
use crate::stats::{RunTracker, StatisticsCollector, StatisticsWriter};
use crate::storage::{Cell, CompactionEnv, Configuration, InternalScanner, MergeRegions, RegionInfo};
use crate::{log_debug, log_error, log_warn, Result, Status};

/// Everything one compaction of one region and family owns for statistics.
struct CollectionCycle {
    region: RegionInfo,
    family: Vec<u8>,
    merge_regions: Option<MergeRegions>,
    delegate: Box<dyn InternalScanner>,
    collector: Box<dyn StatisticsCollector>,
    writer: Box<dyn StatisticsWriter>,
    tracker: Arc<RunTracker>,
    logger: Arc<dyn Logger>,
}

impl CollectionCycle {
    fn update_stat(&mut self, results: &[Cell]) {
        if !results.is_empty() {
            self.collector.collect_statistics(results);
        }
    }

    /// Replaces the stored statistics with the collected ones, then releases
    /// every resource of the cycle. Runs inline or on the tracker pool.
    fn commit(mut self) -> Result<()> {
        let rs = self.update_statistics_table();
        if let Err(e) = &rs {
            log_error!(self.logger, "Failed to update statistics table for region {}: {}", self.region, e);
        }
        self.release(rs)
    }

    fn update_statistics_table(&mut self) -> Result<()> {
        let mut mutations = Vec::new();
        let collector = &*self.collector;
        if let Some(merge_regions) = &self.merge_regions {
            for source in merge_regions.iter() {
                log_debug!(self.logger, "Deleting stale stats for the region {} as part of major compaction",
                    source);
                self.writer.delete_stats(source.region_name(), collector, &self.family, &mut mutations)?;
            }
        }
        log_debug!(self.logger, "Deleting the stats for the region {} as part of major compaction",
            self.region);
        self.writer.delete_stats(self.region.region_name(), collector, &self.family, &mut mutations)?;

        log_debug!(self.logger, "Adding new stats for the region {} as part of major compaction",
            self.region);
        self.writer.add_stats(self.region.region_name(), collector, &self.family, &mut mutations)?;

        log_debug!(self.logger, "Committing new stats for the region {} as part of major compaction",
            self.region);
        self.writer.commit_stats(mutations)
    }

    fn release(self, primary: Result<()>) -> Result<()> {
        let CollectionCycle { region, tracker, mut writer, mut delegate, logger, .. } = self;
        let mut closers = CloseStack::new(&logger);
        closers
            .push("compacting region", || {
                tracker.remove_compacting_region(&region);
                Ok(())
            })
            .push("statistics writer", || writer.close())
            .push("compaction scanner", || delegate.close());
        closers.close_all(primary)
    }
}

/// Compaction scanner that collects statistics from every batch it hands out
/// and commits them when closed.
pub struct StatisticsScanner {
    cycle: Option<CollectionCycle>,
    config: Arc<Configuration>,
}

impl StatisticsScanner {
    pub fn new(collector: Box<dyn StatisticsCollector>,
               writer: Box<dyn StatisticsWriter>,
               env: &CompactionEnv,
               delegate: Box<dyn InternalScanner>,
               family: &[u8],
               merge_regions: Option<MergeRegions>) -> Self {
        if !env.tracker.add_compacting_region(&env.region) {
            log_warn!(env.logger(), "Region {} is already collecting stats on compaction", env.region);
        }
        Self {
            cycle: Some(CollectionCycle {
                region: env.region.clone(),
                family: family.to_vec(),
                merge_regions,
                delegate,
                collector,
                writer,
                tracker: env.tracker.clone(),
                logger: env.logger().clone(),
            }),
            config: env.config.clone(),
        }
    }

    pub fn region(&self) -> Option<&RegionInfo> {
        self.cycle.as_ref().map(|x| &x.region)
    }

    pub fn is_closed(&self) -> bool {
        self.cycle.is_none()
    }

    fn cycle_mut(&mut self) -> Result<&mut CollectionCycle> {
        self.cycle.as_mut().ok_or_else(|| Status::Closed("statistics scanner".to_string()))
    }
}

impl InternalScanner for StatisticsScanner {
    fn next(&mut self, results: &mut Vec<Cell>) -> Result<bool> {
        let cycle = self.cycle_mut()?;
        let start = results.len();
        let more = cycle.delegate.next(results)?;
        cycle.update_stat(&results[start..]);
        Ok(more)
    }

    fn next_with_limit(&mut self, results: &mut Vec<Cell>, limit: usize) -> Result<bool> {
        let cycle = self.cycle_mut()?;
        let start = results.len();
        let more = cycle.delegate.next_with_limit(results, limit)?;
        cycle.update_stat(&results[start..]);
        Ok(more)
    }

    fn close(&mut self) -> Result<()> {
        let cycle = match self.cycle.take() {
            Some(cycle) => cycle,
            None => return Ok(()),
        };
        if !self.config.commit_stats_async() {
            return cycle.commit();
        }

        let tracker = cycle.tracker.clone();
        let logger = cycle.logger.clone();
        let region = cycle.region.clone();
        let task_logger = logger.clone();
        let task = move || {
            let region = cycle.region.clone();
            let rs = cycle.commit();
            if let Err(e) = &rs {
                log_error!(task_logger, "Asynchronous statistics commit for region {} failed: {}", region, e);
            }
            rs
        };
        if let Err(task) = tracker.run_task(task) {
            log_warn!(logger, "Statistics run tracker {} is shut down, committing region {} inline",
                tracker.name(), region);
            let _ = task();
        }
        Ok(())
    }
}

impl Drop for StatisticsScanner {
    fn drop(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            let logger = cycle.logger.clone();
            log_warn!(logger, "Statistics scanner for region {} dropped without close, stats not committed",
                cycle.region);
            if let Err(e) = cycle.release(Ok(())) {
                log_error!(logger, "Error while releasing abandoned statistics scanner: {}", e);
            }
        }
    }
}

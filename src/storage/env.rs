use std::sync::Arc;

use crate::base::Logger;
use crate::stats::RunTracker;
use crate::storage::{Configuration, RegionInfo};

/// What a compaction hands to the statistics layer about where it runs.
#[derive(Clone)]
pub struct CompactionEnv {
    pub region: RegionInfo,
    pub config: Arc<Configuration>,
    pub tracker: Arc<RunTracker>,
}

impl CompactionEnv {
    pub fn new(region: RegionInfo, config: &Arc<Configuration>, tracker: &Arc<RunTracker>) -> Self {
        Self {
            region,
            config: config.clone(),
            tracker: tracker.clone(),
        }
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.config.logger
    }
}

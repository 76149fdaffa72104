mod collector;
mod guidepost;
mod scanner;
mod tracker;
mod writer;

pub mod table;

pub use collector::*;
pub use guidepost::*;
pub use scanner::*;
pub use table::{MemStatisticsTable, Mutation, StatisticsTable};
pub use tracker::*;
pub use writer::*;

use crate::log_debug;
use crate::storage::{CompactionEnv, InternalScanner, MergeRegions};

/// Wraps the scanner of a starting compaction so it collects statistics for
/// `family`, or hands `delegate` back untouched when collection is disabled.
pub fn create_compaction_scanner(env: &CompactionEnv,
                                 family: &[u8],
                                 delegate: Box<dyn InternalScanner>,
                                 merge_regions: Option<MergeRegions>,
                                 writer: Box<dyn StatisticsWriter>) -> Box<dyn InternalScanner> {
    let options = env.config.options();
    if !options.stats_collection_enabled {
        log_debug!(env.logger(), "Statistics collection disabled, skipping region {}", env.region);
        return delegate;
    }
    let collector = DefaultStatisticsCollector::new(options.guidepost_width_bytes);
    Box::new(StatisticsScanner::new(Box::new(collector), writer, env, delegate, family, merge_regions))
}

use std::collections::BTreeMap;

use crate::stats::{GuidePostsInfo, GuidePostsInfoBuilder};
use crate::storage::Cell;

/// Streaming aggregator fed with every batch a compaction rewrites.
pub trait StatisticsCollector: Send {
    fn collect_statistics(&mut self, cells: &[Cell]);

    fn guideposts(&self, family: &[u8]) -> Option<&GuidePostsInfo>;

    fn families(&self) -> Vec<Vec<u8>>;

    fn max_timestamp(&self) -> u64;
}

pub struct DefaultStatisticsCollector {
    guidepost_width: u64,
    families: BTreeMap<Vec<u8>, GuidePostsInfoBuilder>,
    max_timestamp: u64,
}

impl DefaultStatisticsCollector {
    pub fn new(guidepost_width: u64) -> Self {
        Self {
            guidepost_width,
            families: BTreeMap::new(),
            max_timestamp: 0,
        }
    }

    pub fn guidepost_width(&self) -> u64 {
        self.guidepost_width
    }
}

impl StatisticsCollector for DefaultStatisticsCollector {
    fn collect_statistics(&mut self, cells: &[Cell]) {
        for cell in cells {
            match self.families.get_mut(&cell.family) {
                Some(builder) => builder.add_cell(cell),
                None => {
                    let mut builder = GuidePostsInfoBuilder::new(self.guidepost_width);
                    builder.add_cell(cell);
                    self.families.insert(cell.family.clone(), builder);
                }
            }
            if cell.timestamp > self.max_timestamp {
                self.max_timestamp = cell.timestamp;
            }
        }
    }

    fn guideposts(&self, family: &[u8]) -> Option<&GuidePostsInfo> {
        self.families.get(family).map(|x| x.info())
    }

    fn families(&self) -> Vec<Vec<u8>> {
        self.families.keys().cloned().collect()
    }

    fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }
}

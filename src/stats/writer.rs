use std::sync::Arc;

use chrono::Utc;

use crate::stats::{GuidePost, StatisticsCollector};
use crate::stats::table::{decode_stats_value, encode_stats_value, guidepost_row_key, Mutation,
                          parse_row_key, stats_row_prefix, StatisticsTable, StatsColumn, StatsRowKey,
                          summary_row_key, u64_column};
use crate::{Result, Status};

/// Transactional sink the commit protocol writes statistics through.
///
/// `delete_stats` and `add_stats` only append to `batch`; nothing is visible
/// until `commit_stats`.
pub trait StatisticsWriter: Send {
    fn delete_stats(&mut self, region_name: &[u8], collector: &dyn StatisticsCollector,
                    family: &[u8], batch: &mut Vec<Mutation>) -> Result<()>;

    fn add_stats(&mut self, region_name: &[u8], collector: &dyn StatisticsCollector,
                 family: &[u8], batch: &mut Vec<Mutation>) -> Result<()>;

    fn commit_stats(&mut self, batch: Vec<Mutation>) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

pub struct TableStatisticsWriter {
    table: Arc<dyn StatisticsTable>,
    closed: bool,
}

impl TableStatisticsWriter {
    pub fn new(table: &Arc<dyn StatisticsTable>) -> Self {
        Self {
            table: table.clone(),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Status::Closed("statistics writer".to_string()))
        } else {
            Ok(())
        }
    }
}

impl StatisticsWriter for TableStatisticsWriter {
    fn delete_stats(&mut self, region_name: &[u8], _collector: &dyn StatisticsCollector,
                    family: &[u8], batch: &mut Vec<Mutation>) -> Result<()> {
        self.ensure_open()?;
        batch.push(Mutation::DeletePrefix { prefix: stats_row_prefix(region_name, family) });
        Ok(())
    }

    fn add_stats(&mut self, region_name: &[u8], collector: &dyn StatisticsCollector,
                 family: &[u8], batch: &mut Vec<Mutation>) -> Result<()> {
        self.ensure_open()?;
        let info = match collector.guideposts(family) {
            Some(info) => info,
            None => return Ok(()),
        };
        for guidepost in &info.guideposts {
            batch.push(Mutation::Put {
                key: guidepost_row_key(region_name, family, &guidepost.key),
                value: encode_stats_value(&[
                    (StatsColumn::RowCount, guidepost.row_count.to_be_bytes().to_vec()),
                    (StatsColumn::ByteCount, guidepost.byte_count.to_be_bytes().to_vec()),
                ]),
            });
        }
        let update_time = Utc::now().timestamp_millis().max(0) as u64;
        batch.push(Mutation::Put {
            key: summary_row_key(region_name, family),
            value: encode_stats_value(&[
                (StatsColumn::RowCount, info.row_count.to_be_bytes().to_vec()),
                (StatsColumn::ByteCount, info.byte_count.to_be_bytes().to_vec()),
                (StatsColumn::UpdateTime, update_time.to_be_bytes().to_vec()),
                (StatsColumn::MinKey, info.min_key.clone()),
                (StatsColumn::MaxKey, info.max_key.clone()),
                (StatsColumn::MaxTimestamp, info.max_timestamp.to_be_bytes().to_vec()),
            ]),
        });
        Ok(())
    }

    fn commit_stats(&mut self, batch: Vec<Mutation>) -> Result<()> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(());
        }
        self.table.apply(&batch)
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}

/// Committed statistics of one region and column family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionStatistics {
    pub guideposts: Vec<GuidePost>,
    pub byte_count: u64,
    pub row_count: u64,
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
    pub max_timestamp: u64,
    pub update_time: u64,
}

pub fn read_stats(table: &dyn StatisticsTable, region_name: &[u8], family: &[u8])
                  -> Result<Option<RegionStatistics>> {
    let prefix = stats_row_prefix(region_name, family);
    let rows = table.scan_prefix(&prefix)?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut stats = RegionStatistics::default();
    for (key, value) in &rows {
        let columns = decode_stats_value(value)?;
        match parse_row_key(&prefix, key)? {
            StatsRowKey::Summary => {
                for (column, value) in columns {
                    match column {
                        StatsColumn::RowCount => stats.row_count = u64_column(&value)?,
                        StatsColumn::ByteCount => stats.byte_count = u64_column(&value)?,
                        StatsColumn::UpdateTime => stats.update_time = u64_column(&value)?,
                        StatsColumn::MinKey => stats.min_key = value,
                        StatsColumn::MaxKey => stats.max_key = value,
                        StatsColumn::MaxTimestamp => stats.max_timestamp = u64_column(&value)?,
                    }
                }
            }
            StatsRowKey::GuidePost(guidepost_key) => {
                let mut guidepost = GuidePost { key: guidepost_key.to_vec(), ..GuidePost::default() };
                for (column, value) in columns {
                    match column {
                        StatsColumn::RowCount => guidepost.row_count = u64_column(&value)?,
                        StatsColumn::ByteCount => guidepost.byte_count = u64_column(&value)?,
                        _ => (),
                    }
                }
                stats.guideposts.push(guidepost);
            }
        }
    }
    Ok(Some(stats))
}

#[cfg(test)]
mod tests {
    use crate::stats::{DefaultStatisticsCollector, MemStatisticsTable};
    use crate::storage::Cell;

    use super::*;

    fn collected() -> DefaultStatisticsCollector {
        // 40 bytes per cell, guidepost every 80 bytes.
        let mut collector = DefaultStatisticsCollector::new(80);
        let cells: Vec<Cell> = (0..5)
            .map(|i| Cell::put(format!("r{}", i).as_bytes(), b"f", b"q", 10 + i, &[0u8; 27]))
            .collect();
        collector.collect_statistics(&cells);
        collector
    }

    #[test]
    fn add_then_commit_then_read() -> Result<()> {
        let mem = Arc::new(MemStatisticsTable::new());
        let table: Arc<dyn StatisticsTable> = mem.clone();
        let mut writer = TableStatisticsWriter::new(&table);
        let collector = collected();

        let mut batch = Vec::new();
        writer.delete_stats(b"region-1", &collector, b"f", &mut batch)?;
        writer.add_stats(b"region-1", &collector, b"f", &mut batch)?;
        assert_eq!(4, batch.len());
        assert!(mem.is_empty());
        writer.commit_stats(batch)?;

        let stats = read_stats(table.as_ref(), b"region-1", b"f")?.unwrap();
        assert_eq!(5, stats.row_count);
        assert_eq!(200, stats.byte_count);
        assert_eq!(b"r0", stats.min_key.as_slice());
        assert_eq!(b"r4", stats.max_key.as_slice());
        assert_eq!(14, stats.max_timestamp);
        assert!(stats.update_time > 0);
        let keys: Vec<&[u8]> = stats.guideposts.iter().map(|x| x.key.as_slice()).collect();
        assert_eq!(vec![b"r1".as_slice(), b"r3"], keys);
        assert_eq!(2, stats.guideposts[0].row_count);
        Ok(())
    }

    #[test]
    fn delete_clears_previous_stats() -> Result<()> {
        let table: Arc<dyn StatisticsTable> = Arc::new(MemStatisticsTable::new());
        let mut writer = TableStatisticsWriter::new(&table);
        let collector = collected();

        let mut batch = Vec::new();
        writer.add_stats(b"region-1", &collector, b"f", &mut batch)?;
        writer.commit_stats(batch)?;

        let empty = DefaultStatisticsCollector::new(80);
        let mut batch = Vec::new();
        writer.delete_stats(b"region-1", &empty, b"f", &mut batch)?;
        writer.add_stats(b"region-1", &empty, b"f", &mut batch)?;
        assert_eq!(1, batch.len());
        writer.commit_stats(batch)?;
        assert_eq!(None, read_stats(table.as_ref(), b"region-1", b"f")?);
        Ok(())
    }

    #[test]
    fn closed_writer_rejects_everything() -> Result<()> {
        let table: Arc<dyn StatisticsTable> = Arc::new(MemStatisticsTable::new());
        let mut writer = TableStatisticsWriter::new(&table);
        writer.close()?;
        let collector = collected();
        let mut batch = Vec::new();
        assert!(writer.delete_stats(b"r", &collector, b"f", &mut batch).is_err());
        assert!(writer.add_stats(b"r", &collector, b"f", &mut batch).is_err());
        assert!(writer.commit_stats(Vec::new()).is_err());
        assert_eq!(Err(Status::Closed("statistics writer".to_string())), writer.close());
        Ok(())
    }
}

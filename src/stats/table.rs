use std::collections::BTreeMap;
use std::sync::RwLock;

use bytes::{Buf, BufMut};
use crc::{Crc, CRC_32_ISCSI};
use num_enum::TryFromPrimitive;

use crate::{Corrupting, Result, Status};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Put { key: Vec<u8>, value: Vec<u8> },
    DeletePrefix { prefix: Vec<u8> },
}

/// Durable store of statistics rows.
pub trait StatisticsTable: Send + Sync {
    /// Applies the whole batch, in order, as one atomic change.
    fn apply(&self, batch: &[Mutation]) -> Result<()>;

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

#[derive(Default)]
pub struct MemStatisticsTable {
    rows: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStatisticsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|x| x.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatisticsTable for MemStatisticsTable {
    fn apply(&self, batch: &[Mutation]) -> Result<()> {
        let mut rows = self.rows.write()
            .map_err(|e| Status::corrupted(e.to_string()))?;
        for mutation in batch {
            match mutation {
                Mutation::Put { key, value } => {
                    rows.insert(key.clone(), value.clone());
                }
                Mutation::DeletePrefix { prefix } => {
                    let doomed: Vec<Vec<u8>> = rows.range(prefix.clone()..)
                        .take_while(|(k, _)| k.starts_with(prefix))
                        .map(|(k, _)| k.clone())
                        .collect();
                    for key in doomed {
                        rows.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let rows = self.rows.read()
            .map_err(|e| Status::corrupted(e.to_string()))?;
        Ok(rows.range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

// Row key: len(region) region len(family) family marker [guidepost key]
const SUMMARY_MARKER: u8 = 0;
const GUIDEPOST_MARKER: u8 = 1;

pub fn stats_row_prefix(region_name: &[u8], family: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + region_name.len() + family.len());
    key.put_u32(region_name.len() as u32);
    key.put_slice(region_name);
    key.put_u32(family.len() as u32);
    key.put_slice(family);
    key
}

pub fn summary_row_key(region_name: &[u8], family: &[u8]) -> Vec<u8> {
    let mut key = stats_row_prefix(region_name, family);
    key.put_u8(SUMMARY_MARKER);
    key
}

pub fn guidepost_row_key(region_name: &[u8], family: &[u8], guidepost: &[u8]) -> Vec<u8> {
    let mut key = stats_row_prefix(region_name, family);
    key.put_u8(GUIDEPOST_MARKER);
    key.put_slice(guidepost);
    key
}

pub enum StatsRowKey<'a> {
    Summary,
    GuidePost(&'a [u8]),
}

/// Splits a key produced by `summary_row_key` or `guidepost_row_key` under `prefix`.
pub fn parse_row_key<'a>(prefix: &[u8], key: &'a [u8]) -> Result<StatsRowKey<'a>> {
    if !key.starts_with(prefix) || key.len() == prefix.len() {
        return Err(Status::corrupted("statistics row key outside of its prefix"));
    }
    let rest = &key[prefix.len()..];
    match rest[0] {
        SUMMARY_MARKER if rest.len() == 1 => Ok(StatsRowKey::Summary),
        GUIDEPOST_MARKER => Ok(StatsRowKey::GuidePost(&rest[1..])),
        marker => Err(Status::corrupted(format!("bad statistics row marker: {}", marker))),
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum StatsColumn {
    RowCount = 1,
    ByteCount = 2,
    UpdateTime = 3,
    MinKey = 4,
    MaxKey = 5,
    MaxTimestamp = 6,
}

const CHECKSUM_SIZE: usize = 4;

/// Encodes `(column, bytes)` pairs followed by a CRC32 of everything before it.
pub fn encode_stats_value(columns: &[(StatsColumn, Vec<u8>)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (column, value) in columns {
        buf.put_u8(*column as u8);
        buf.put_u32(value.len() as u32);
        buf.put_slice(value);
    }
    let crc = Crc::<u32>::new(&CRC_32_ISCSI);
    let mut digest = crc.digest();
    digest.update(&buf);
    buf.put_u32(digest.finalize());
    buf
}

pub fn decode_stats_value(value: &[u8]) -> Result<Vec<(StatsColumn, Vec<u8>)>> {
    if value.len() < CHECKSUM_SIZE {
        return Err(Status::corrupted("statistics value too short"));
    }
    let (body, mut trailer) = value.split_at(value.len() - CHECKSUM_SIZE);
    let crc = Crc::<u32>::new(&CRC_32_ISCSI);
    let mut digest = crc.digest();
    digest.update(body);
    if digest.finalize() != trailer.get_u32() {
        return Err(Status::corrupted("statistics value checksum mismatch"));
    }

    let mut columns = Vec::new();
    let mut buf = body;
    while buf.has_remaining() {
        if buf.remaining() < 5 {
            return Err(Status::corrupted("truncated statistics column"));
        }
        let tag = buf.get_u8();
        let column = StatsColumn::try_from_primitive(tag)
            .map_err(|_| Status::corrupted(format!("unknown statistics column: {}", tag)))?;
        let len = buf.get_u32() as usize;
        if buf.remaining() < len {
            return Err(Status::corrupted("truncated statistics column"));
        }
        columns.push((column, buf[..len].to_vec()));
        buf.advance(len);
    }
    Ok(columns)
}

pub fn u64_column(value: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = value.try_into()
        .map_err(|_| Status::corrupted("statistics counter is not 8 bytes"))?;
    Ok(u64::from_be_bytes(bytes))
}

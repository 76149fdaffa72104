use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Identity of one contiguous key range of a table.
#[derive(Clone)]
pub struct RegionInfo {
    pub table: String,
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub region_id: u64,
    region_name: Vec<u8>,
}

impl RegionInfo {
    pub fn new(table: &str, start_key: &[u8], end_key: &[u8], region_id: u64) -> Self {
        let mut region_name = Vec::with_capacity(table.len() + start_key.len() + 22);
        region_name.extend_from_slice(table.as_bytes());
        region_name.push(b',');
        region_name.extend_from_slice(start_key);
        region_name.push(b',');
        region_name.extend_from_slice(region_id.to_string().as_bytes());
        Self {
            table: table.to_string(),
            start_key: start_key.to_vec(),
            end_key: end_key.to_vec(),
            region_id,
            region_name,
        }
    }

    /// `table,start_key,region_id`.
    pub fn region_name(&self) -> &[u8] {
        &self.region_name
    }

    pub fn region_name_as_string(&self) -> String {
        String::from_utf8_lossy(&self.region_name).to_string()
    }

}

impl PartialEq for RegionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.region_name == other.region_name
    }
}

impl Eq for RegionInfo {}

impl Hash for RegionInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.region_name.hash(state)
    }
}

impl Debug for RegionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RegionInfo({})", self.region_name_as_string())
    }
}

impl Display for RegionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.region_name_as_string())
    }
}

/// Source regions of a merge being finalized by the current compaction.
#[derive(Clone, Debug, Default)]
pub struct MergeRegions {
    pub first: Option<RegionInfo>,
    pub second: Option<RegionInfo>,
}

impl MergeRegions {
    pub fn new(first: Option<RegionInfo>, second: Option<RegionInfo>) -> Self {
        Self { first, second }
    }

    pub fn iter(&self) -> impl Iterator<Item=&RegionInfo> {
        self.first.iter().chain(self.second.iter())
    }
}

use crate::storage::Cell;

/// Boundary row key closing a chunk of roughly `guidepost width` bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuidePost {
    pub key: Vec<u8>,
    pub byte_count: u64,
    pub row_count: u64,
}

/// Statistics of one column family within one region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuidePostsInfo {
    pub guideposts: Vec<GuidePost>,
    pub byte_count: u64,
    pub row_count: u64,
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
    pub max_timestamp: u64,
}

impl GuidePostsInfo {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn guidepost_keys(&self) -> Vec<&[u8]> {
        self.guideposts.iter().map(|x| x.key.as_slice()).collect()
    }
}

pub struct GuidePostsInfoBuilder {
    width: u64,
    chunk_bytes: u64,
    chunk_rows: u64,
    last_row: Option<Vec<u8>>,
    info: GuidePostsInfo,
}

impl GuidePostsInfoBuilder {
    /// A width of zero never emits guideposts, only totals.
    pub fn new(width: u64) -> Self {
        Self {
            width,
            chunk_bytes: 0,
            chunk_rows: 0,
            last_row: None,
            info: GuidePostsInfo::default(),
        }
    }

    pub fn add_cell(&mut self, cell: &Cell) {
        if self.last_row.as_deref() != Some(cell.row.as_slice()) {
            self.start_row(&cell.row);
        }
        let bytes = cell.len() as u64;
        self.chunk_bytes += bytes;
        self.info.byte_count += bytes;
        if cell.timestamp > self.info.max_timestamp {
            self.info.max_timestamp = cell.timestamp;
        }

        if self.width > 0 && self.chunk_bytes >= self.width {
            self.emit_guidepost(&cell.row);
        }
    }

    pub fn info(&self) -> &GuidePostsInfo {
        &self.info
    }

    pub fn build(self) -> GuidePostsInfo {
        self.info
    }

    fn start_row(&mut self, row: &[u8]) {
        self.chunk_rows += 1;
        self.info.row_count += 1;
        if self.info.row_count == 1 || row < self.info.min_key.as_slice() {
            self.info.min_key = row.to_vec();
        }
        if row > self.info.max_key.as_slice() {
            self.info.max_key = row.to_vec();
        }
        self.last_row = Some(row.to_vec());
    }

    fn emit_guidepost(&mut self, row: &[u8]) {
        // A wide row can fill several chunks; keep one guidepost per key.
        match self.info.guideposts.last_mut() {
            Some(last) if last.key == row => {
                last.byte_count += self.chunk_bytes;
                last.row_count += self.chunk_rows;
            }
            _ => self.info.guideposts.push(GuidePost {
                key: row.to_vec(),
                byte_count: self.chunk_bytes,
                row_count: self.chunk_rows,
            }),
        }
        self.chunk_bytes = 0;
        self.chunk_rows = 0;
    }
}

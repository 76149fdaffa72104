use std::fmt::{Debug, Formatter};
use std::mem::size_of;

use num_enum::TryFromPrimitive;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum Tag {
    Put = 0,
    Deletion = 1,
}

/// One versioned key/value, as handed out by a compaction scanner.
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: Vec<u8>,
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub timestamp: u64,
    pub tag: Tag,
    pub value: Vec<u8>,
}

pub const TIMESTAMP_SIZE: usize = size_of::<u64>();
pub const TAG_SIZE: usize = size_of::<u8>();

impl Cell {
    pub fn put(row: &[u8], family: &[u8], qualifier: &[u8], timestamp: u64, value: &[u8]) -> Self {
        Self {
            row: row.to_vec(),
            family: family.to_vec(),
            qualifier: qualifier.to_vec(),
            timestamp,
            tag: Tag::Put,
            value: value.to_vec(),
        }
    }

    pub fn deletion(row: &[u8], family: &[u8], qualifier: &[u8], timestamp: u64) -> Self {
        Self {
            row: row.to_vec(),
            family: family.to_vec(),
            qualifier: qualifier.to_vec(),
            timestamp,
            tag: Tag::Deletion,
            value: Vec::new(),
        }
    }

    pub fn key_len(&self) -> usize {
        self.row.len() + self.family.len() + self.qualifier.len() + TIMESTAMP_SIZE + TAG_SIZE
    }

    /// Serialized size of the cell, the unit guideposts are measured in.
    pub fn len(&self) -> usize {
        self.key_len() + self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}@{}/{:?}",
               String::from_utf8_lossy(&self.row),
               String::from_utf8_lossy(&self.family),
               String::from_utf8_lossy(&self.qualifier),
               self.timestamp,
               self.tag)
    }
}

use std::collections::VecDeque;

use crate::storage::Cell;
use crate::{Result, Status};

/// Pull-based scanner a compaction reads cells from.
///
/// Each `next` appends the next batch to `results` and returns whether more
/// batches may follow.
pub trait InternalScanner: Send {
    fn next(&mut self, results: &mut Vec<Cell>) -> Result<bool>;

    /// Like `next`, but appends at most `limit` cells. A limit of zero means no limit.
    fn next_with_limit(&mut self, results: &mut Vec<Cell>, limit: usize) -> Result<bool>;

    fn close(&mut self) -> Result<()>;
}

/// Scanner over cells held in memory, yielding one row per `next`.
pub struct MemoryScanner {
    cells: VecDeque<Cell>,
    closed: bool,
}

impl MemoryScanner {
    /// Cells are sorted by row, family, qualifier and newest timestamp first.
    pub fn new(mut cells: Vec<Cell>) -> Self {
        cells.sort_by(|a, b| {
            a.row.cmp(&b.row)
                .then_with(|| a.family.cmp(&b.family))
                .then_with(|| a.qualifier.cmp(&b.qualifier))
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        Self {
            cells: cells.into(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn fill(&mut self, results: &mut Vec<Cell>, limit: usize) -> Result<bool> {
        if self.closed {
            return Err(Status::Closed("memory scanner".to_string()));
        }
        let row = match self.cells.front() {
            Some(cell) => cell.row.clone(),
            None => return Ok(false),
        };
        let mut n = 0;
        while let Some(cell) = self.cells.front() {
            if cell.row != row || (limit > 0 && n >= limit) {
                break;
            }
            if let Some(cell) = self.cells.pop_front() {
                results.push(cell);
                n += 1;
            }
        }
        Ok(!self.cells.is_empty())
    }
}

impl InternalScanner for MemoryScanner {
    fn next(&mut self, results: &mut Vec<Cell>) -> Result<bool> {
        self.fill(results, 0)
    }

    fn next_with_limit(&mut self, results: &mut Vec<Cell>, limit: usize) -> Result<bool> {
        self.fill(results, limit)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.cells.clear();
        Ok(())
    }
}

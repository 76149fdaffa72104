use std::sync::Arc;

use crate::base::Logger;
use crate::{log_error, Result};

type Closer<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

/// Deferred cleanup actions that must all run, reporting only the first failure.
///
/// Closers run in the order they were pushed. Every closer is attempted even
/// after an earlier one failed; failures after the first are logged and dropped.
pub struct CloseStack<'a> {
    logger: Arc<dyn Logger>,
    closers: Vec<(&'static str, Closer<'a>)>,
}

impl<'a> CloseStack<'a> {
    pub fn new(logger: &Arc<dyn Logger>) -> Self {
        Self {
            logger: logger.clone(),
            closers: Vec::new(),
        }
    }

    pub fn push<F>(&mut self, name: &'static str, closer: F) -> &mut Self
        where F: FnOnce() -> Result<()> + 'a {
        self.closers.push((name, Box::new(closer)));
        self
    }

    pub fn len(&self) -> usize {
        self.closers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closers.is_empty()
    }

    /// Runs every closer. `primary` is the outcome of the guarded work and wins over
    /// any cleanup failure.
    pub fn close_all(self, primary: Result<()>) -> Result<()> {
        let mut first = primary.err();
        for (name, closer) in self.closers {
            if let Err(e) = closer() {
                log_error!(self.logger, "error while running closer {}: {}", name, e);
                if first.is_none() {
                    first = Some(e);
                }
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TransformError;

/// Shared flag a host sets to stop a running operation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Percent-complete reporter handed to long-running operations
///
/// Reported values never decrease and never exceed 100, whatever the caller
/// feeds into [`Progress::advance`].
pub struct Progress<'a> {
    callback: Option<Box<dyn FnMut(u8) + 'a>>,
    cancel: Option<CancelToken>,
    last: Option<u8>,
}

impl<'a> Progress<'a> {
    /// A reporter that reports nowhere and is never cancelled
    pub fn none() -> Self {
        Self { callback: None, cancel: None, last: None }
    }

    pub fn new(callback: impl FnMut(u8) + 'a) -> Self {
        Self { callback: Some(Box::new(callback)), cancel: None, last: None }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Call before starting each unit of work
    pub fn checkpoint(&self) -> Result<(), TransformError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(TransformError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Report that `done` of `total` units have completed
    pub fn advance(&mut self, done: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            (done.min(total) * 100 / total) as u8
        };
        self.report(percent);
    }

    /// Report completion
    pub fn finish(&mut self) {
        self.report(100);
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        if let Some(callback) = self.callback.as_mut() {
            callback(percent);
        }
    }
}

impl Default for Progress<'_> {
    fn default() -> Self {
        Self::none()
    }
}

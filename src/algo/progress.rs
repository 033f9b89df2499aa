//! Progress reporting for tessellation runs.
//!
//! The scheduler processes patches one generation at a time. A [`Progress`]
//! callback hears about each finished generation and, within it, about every
//! patch that was diced, split or discarded.
//!
//! # Example
//!
//! ```
//! use lathwork::algo::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 4, "generation 1");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

/// A callback receiving `(current, total, message)` updates.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a reporter from a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress of step `range_current` of `range_total`, itself
    /// `sub_current / sub_total` complete.
    ///
    /// Values are scaled by 1000 so the callback always sees integers.
    #[inline]
    pub fn report_sub(
        &self,
        sub_current: usize,
        sub_total: usize,
        range_current: usize,
        range_total: usize,
        message: &str,
    ) {
        if sub_total == 0 || range_total == 0 {
            return;
        }
        let sub_fraction = (sub_current.min(sub_total) * 1000) / sub_total;
        (self.callback)(range_current * 1000 + sub_fraction, range_total * 1000, message);
    }

    /// A reporter that discards every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

/// Thread-safe counter for work items finished inside a parallel pass.
#[derive(Debug, Default)]
pub(crate) struct Counter(AtomicUsize);

impl Counter {
    /// Increment and return the new count.
    pub(crate) fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_report_sub_scales() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |c, t, m| sink.lock().unwrap().push((c, t, m.to_string())));

        progress.report(2, 5, "whole");
        progress.report_sub(1, 4, 2, 5, "part");
        progress.report_sub(1, 0, 2, 5, "ignored");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (2, 5, "whole".to_string()));
        assert_eq!(seen[1], (2250, 5000, "part".to_string()));
    }

    #[test]
    fn test_counter() {
        let c = Counter::default();
        assert_eq!(c.bump(), 1);
        assert_eq!(c.bump(), 2);
    }
}

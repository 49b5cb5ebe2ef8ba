/// Wraps a caller's progress callback and keeps reported percentages
/// non-decreasing and within `0..=100`.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn FnMut(&str, u8),
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    /// Start at 0%.
    pub fn new(sink: &'a mut dyn FnMut(&str, u8)) -> Self {
        Self { sink, last: 0 }
    }

    /// Emit one step. Values below the previous one are raised to it.
    pub fn report(&mut self, step: &str, percent: u8) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        tracing::debug!(step, percent, "progress");
        (self.sink)(step, percent);
    }

    /// Last emitted percentage.
    pub fn last(&self) -> u8 {
        self.last
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/progress.rs"]
mod tests;

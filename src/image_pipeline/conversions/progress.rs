//! Progress reporting passed explicitly into each pipeline run.

/// Receives `(percent_complete, status_text)` at pipeline milestones.
pub trait ProgressSink {
    fn report(&mut self, percent: u8, status: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(u8, &str),
{
    fn report(&mut self, percent: u8, status: &str) {
        self(percent, status)
    }
}

/// Discards all progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8, _status: &str) {}
}

/// Prefixes status text and keeps reported percentages non-decreasing.
pub(crate) struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    prefix: String,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(sink: &'a mut dyn ProgressSink, prefix: impl Into<String>) -> Self {
        Self {
            sink,
            prefix: prefix.into(),
            last: 0,
        }
    }

    pub(crate) fn step(&mut self, percent: u8, detail: &str) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        tracing::debug!(percent, "{}{}", self.prefix, detail);
        self.sink.report(percent, &format!("{}{}", self.prefix, detail));
    }
}

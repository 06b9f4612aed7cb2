use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::drivers::SweepError;
/// Something that yields text records one at a time. `Ok(None)` means end of stream.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<String>, SweepError>;
}
/// Cooperative cancellation flag shared between a worker and whoever stops it.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);
impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<String>,
}
impl ManualSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: lines.into_iter().map(Into::into).collect(),
        }
    }
}
impl LineSource for ManualSource {
    fn next_line(&mut self) -> Result<Option<String>, SweepError> {
        Ok(self.queue.pop_front())
    }
}

//! Dispatch sinks for coordinators

use tokio::sync::mpsc::UnboundedSender;

/// Starts processing a target.
///
/// `process` must return promptly without waiting for the remote result.
/// Completion is reported later through the coordinator's `completed`.
pub trait RequestProcessor<T> {
    fn process(&mut self, target: &T);
}

impl<T, F> RequestProcessor<T> for F
where
    F: FnMut(&T),
{
    fn process(&mut self, target: &T) {
        self(target)
    }
}

/// Forwards dispatched targets to an async consumer
impl<T> RequestProcessor<T> for UnboundedSender<T>
where
    T: Clone + std::fmt::Debug,
{
    fn process(&mut self, target: &T) {
        if self.send(target.clone()).is_err() {
            tracing::warn!(node = ?target, "dispatch channel closed, request dropped");
        }
    }
}

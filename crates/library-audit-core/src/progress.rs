use tracing::{info, warn};

/// Notification emitted while an audit runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Log(String),
    /// Something was skipped or degraded; the run continues
    Warning(String),
    Progress {
        message: String,
        current: usize,
        total: usize,
    },
}

/// Receives progress notifications in the order the engine produces them
pub trait ProgressSink: Send {
    fn emit(&mut self, event: ProgressEvent);

    fn log(&mut self, message: String) {
        self.emit(ProgressEvent::Log(message));
    }

    fn warning(&mut self, message: String) {
        self.emit(ProgressEvent::Warning(message));
    }

    fn progress(&mut self, message: String, current: usize, total: usize) {
        self.emit(ProgressEvent::Progress { message, current, total });
    }
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent) + Send,
{
    fn emit(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards everything
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Forwards events to `tracing`
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Log(message) => info!("{}", message),
            ProgressEvent::Warning(message) => warn!("{}", message),
            ProgressEvent::Progress { message, current, total } => {
                info!(current, total, "{}", message)
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<ProgressEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Warning(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn progress_messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }
}

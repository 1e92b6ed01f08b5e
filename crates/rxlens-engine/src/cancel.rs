use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Shared flag telling an in-flight analysis that its result is no longer
/// wanted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub seq: u64,
    pub token: CancellationToken,
}

/// Hands out monotonically numbered tickets so a caller can keep only the
/// result of the most recent request. Starting a new request cancels the
/// previous one.
#[derive(Debug, Default)]
pub struct AnalysisSequencer {
    latest: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl AnalysisSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> AnalysisTicket {
        let token = CancellationToken::new();
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        AnalysisTicket { seq, token }
    }

    pub fn is_latest(&self, ticket: &AnalysisTicket) -> bool {
        !ticket.token.is_cancelled() && self.latest.load(Ordering::SeqCst) == ticket.seq
    }
}

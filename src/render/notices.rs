use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum diagnostics kept between drains.
pub const MAX_NOTICES: usize = 30;

/// Bounded queue of in-world diagnostics. Render workers push from any
/// thread; the oldest entries fall off once the queue is full.
#[derive(Debug, Default)]
pub struct Notices {
    queue: Mutex<VecDeque<String>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, msg: impl Into<String>) {
        let msg = msg.into();
        let Ok(mut q) = self.queue.lock() else {
            return;
        };
        // A broken column repeats its notice every frame.
        if q.back() == Some(&msg) {
            return;
        }
        log::warn!("{msg}");
        if q.len() == MAX_NOTICES {
            q.pop_front();
        }
        q.push_back(msg);
    }

    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every queued notice, oldest first.
    pub fn drain(&self) -> Vec<String> {
        match self.queue.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop flag shared between a frame loop and whoever controls it.
///
/// The loop polls it once per iteration, so shutdown latency is at most one
/// frame plus any blocking frame wait in progress.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let signal = StopSignal::new();
        let remote = signal.clone();
        assert!(!signal.is_stopped());

        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(signal.is_stopped());
    }
}

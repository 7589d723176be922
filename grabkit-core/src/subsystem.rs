//! Process-wide capture-subsystem lifecycle.
//!
//! Explicit init/teardown entry points the host calls once per process,
//! independent of individual sessions. On platforms whose backends need
//! apartment-style global initialization this is where it happens; the
//! in-process backends only track the flag.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

struct SubsystemState {
    ready: AtomicBool,
    /// Lifetime init count, for diagnostics.
    init_count: Mutex<u64>,
}

static SUBSYSTEM: Lazy<SubsystemState> = Lazy::new(|| SubsystemState {
    ready: AtomicBool::new(false),
    init_count: Mutex::new(0),
});

/// Bring the capture subsystem up. Double initialization is tolerated with
/// a warning.
pub fn init_capture_subsystem() {
    if SUBSYSTEM.ready.swap(true, Ordering::SeqCst) {
        tracing::warn!("capture subsystem already initialized");
        return;
    }

    *SUBSYSTEM.init_count.lock() += 1;
    tracing::info!("capture subsystem initialized");
}

/// Tear the capture subsystem down. Safe to call when not initialized.
pub fn shutdown_capture_subsystem() {
    if SUBSYSTEM.ready.swap(false, Ordering::SeqCst) {
        tracing::info!("capture subsystem shut down");
    }
}

/// Whether [`init_capture_subsystem`] has been called (and not undone).
pub fn capture_subsystem_ready() -> bool {
    SUBSYSTEM.ready.load(Ordering::SeqCst)
}

/// How many times the subsystem has been brought up over the process
/// lifetime (diagnostic).
pub fn capture_subsystem_init_count() -> u64 {
    *SUBSYSTEM.init_count.lock()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_shutdown_round_trip() {
        // Process-global state: exercise the full cycle in one test to
        // avoid ordering dependence between tests.
        shutdown_capture_subsystem();
        assert!(!capture_subsystem_ready());

        let count_before = capture_subsystem_init_count();
        init_capture_subsystem();
        assert!(capture_subsystem_ready());
        assert_eq!(capture_subsystem_init_count(), count_before + 1);
        // Tolerated no-op, not counted.
        init_capture_subsystem();
        assert!(capture_subsystem_ready());
        assert_eq!(capture_subsystem_init_count(), count_before + 1);

        shutdown_capture_subsystem();
        assert!(!capture_subsystem_ready());
        // Safe when already down.
        shutdown_capture_subsystem();
        assert!(!capture_subsystem_ready());
    }
}

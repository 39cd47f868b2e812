//! Cooperative shutdown for the tracking loop.
//!
//! The loop checks the signal once per cycle; a Ctrl+C handler (or a test)
//! triggers it from elsewhere.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// A shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Triggers `signal` on the first Ctrl+C.
///
/// The wait runs on a helper thread with its own single-threaded runtime,
/// so the tracking loop stays synchronous.
pub fn install_ctrl_c(signal: ShutdownSignal) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::info!("interrupt received, stopping after this cycle");
                        signal.trigger();
                    }
                    Err(e) => tracing::warn!(error = %e, "could not listen for Ctrl+C"),
                }
            });
        })?;
    Ok(())
}

//! Ephemeral clipboard delivery.
//!
//! A secret is placed on the shared clipboard for a bounded window and the
//! previous contents are written back afterwards. The window ends when the
//! exposure timer fires or when the process is asked to stop, whichever
//! happens first, and the snapshot is restored exactly once in either case.
//!
//! Ordering of a delivery:
//!
//! 1. snapshot the clipboard (nothing else happens if this fails)
//! 2. arm the interrupt listener
//! 3. publish the secret
//! 4. race the timer against the listener
//! 5. restore the snapshot
//!
//! SIGKILL and similar notifications cannot be intercepted, so a short
//! exposure window is the only bound on exposure in that case.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, error, warn};
use zeroize::Zeroizing;

use crate::clipboard::Clipboard;
use crate::types::ClipboardError;

/// Future that resolves on the first interrupt notification
pub type InterruptFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of process interrupt notifications
pub trait Interrupts {
    /// Install every handler now and return a future for the first notification.
    ///
    /// Handlers must be live when this returns, not when the future is first
    /// polled.
    fn arm(self) -> io::Result<InterruptFuture>;
}

/// Listens for SIGINT, SIGTERM and SIGHUP (Ctrl-C outside Unix)
///
/// Must be armed from inside a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalInterrupts;

impl Interrupts for SignalInterrupts {
    #[cfg(unix)]
    fn arm(self) -> io::Result<InterruptFuture> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;

        Ok(Box::pin(async move {
            tokio::select! {
                _ = interrupt.recv() => warn!("received SIGINT"),
                _ = terminate.recv() => warn!("received SIGTERM"),
                _ = hangup.recv() => warn!("received SIGHUP"),
            }
        }))
    }

    #[cfg(not(unix))]
    fn arm(self) -> io::Result<InterruptFuture> {
        let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

        Ok(Box::pin(async move {
            ctrl_c.recv().await;
            warn!("received Ctrl-C");
        }))
    }
}

/// How the exposure window ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// The full window elapsed
    Elapsed,
    /// An interrupt arrived first; the caller should terminate
    Interrupted,
}

/// State of one delivery: snapshot, payload, deadline and restoration latch.
///
/// Dropping an exposed session that has not been restored writes the
/// snapshot back, so cancelled futures and unwinding still clean up.
pub struct ClipboardSession<'a, C: Clipboard + ?Sized> {
    clipboard: &'a C,
    snapshot: Zeroizing<Vec<u8>>,
    payload: Zeroizing<Vec<u8>>,
    deadline: Option<Instant>,
    restored: AtomicBool,
}

impl<'a, C: Clipboard + ?Sized> ClipboardSession<'a, C> {
    /// Snapshot the clipboard ahead of publishing `payload`
    pub fn open(clipboard: &'a C, payload: &[u8]) -> Result<Self, ClipboardError> {
        let snapshot = clipboard.read().map_err(ClipboardError::ReadFailed)?;
        debug!(snapshot_bytes = snapshot.len(), "clipboard snapshot taken");

        Ok(Self {
            clipboard,
            snapshot: Zeroizing::new(snapshot),
            payload: Zeroizing::new(payload.to_vec()),
            deadline: None,
            restored: AtomicBool::new(false),
        })
    }

    /// Write the payload and start the exposure window
    pub fn publish(&mut self, exposure: Duration) -> Result<Instant, ClipboardError> {
        if let Err(e) = self.clipboard.write(&self.payload) {
            // Nothing was exposed, so there is nothing to restore.
            self.restored.store(true, Ordering::SeqCst);
            return Err(ClipboardError::WriteFailed(e));
        }

        let deadline = Instant::now() + exposure;
        self.deadline = Some(deadline);
        debug!(?exposure, "secret published to clipboard");
        Ok(deadline)
    }

    /// End of the exposure window, once published
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the snapshot has been written back (or never needs to be)
    pub fn is_restored(&self) -> bool {
        self.restored.load(Ordering::SeqCst)
    }

    /// Write the snapshot back.
    ///
    /// Only the first call after a successful publish writes; every other
    /// call returns `Ok(false)`. A failed write is not retried.
    pub fn restore(&self) -> Result<bool, ClipboardError> {
        if self.deadline.is_none() {
            return Ok(false);
        }
        if self
            .restored
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        self.clipboard
            .write(&self.snapshot)
            .map_err(ClipboardError::RestoreFailed)?;
        debug!("clipboard restored");
        Ok(true)
    }
}

impl<C: Clipboard + ?Sized> Drop for ClipboardSession<'_, C> {
    fn drop(&mut self) {
        match self.restore() {
            Ok(true) => warn!("clipboard restored while abandoning delivery"),
            Ok(false) => {}
            Err(e) => error!(error = %e, "clipboard restore failed while abandoning delivery"),
        }
    }
}

/// Expose `secret` on `clipboard` for `exposure`, then restore the previous
/// contents.
///
/// Returns [`Exposure::Interrupted`] when an interrupt cut the window short;
/// the clipboard has already been restored by then and the caller is expected
/// to terminate the process.
pub async fn deliver<C, I>(
    clipboard: &C,
    secret: &[u8],
    exposure: Duration,
    interrupts: I,
) -> Result<Exposure, ClipboardError>
where
    C: Clipboard + ?Sized,
    I: Interrupts,
{
    let mut session = ClipboardSession::open(clipboard, secret)?;
    let interrupted = interrupts.arm().map_err(ClipboardError::ListenerFailed)?;
    let deadline = session.publish(exposure)?;

    let outcome = tokio::select! {
        biased;
        _ = interrupted => Exposure::Interrupted,
        _ = time::sleep_until(deadline) => Exposure::Elapsed,
    };
    debug!(?outcome, "exposure window closed");

    session.restore()?;
    Ok(outcome)
}

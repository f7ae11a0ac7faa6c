use crate::error::Cancelled;
use std::future::Future;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation signal and optional deadline carried by a request.
///
/// Cloning is cheap; every clone observes the same signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    signal: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// The sending half of a [`Cancellation`].
#[derive(Debug)]
pub struct CancelHandle {
    signal: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels every [`Cancellation`] created from this handle.
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }
}

impl Cancellation {
    /// Creates a linked handle/cancellation pair.
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { signal: tx },
            Self {
                signal: rx,
                deadline: None,
            },
        )
    }

    /// A cancellation that never fires.
    pub fn never() -> Self {
        let (_, cancellation) = Self::new();
        cancellation
    }

    /// Adds (or tightens) a deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the signal fires or the deadline passes.
    pub async fn cancelled(&self) {
        let mut signal = self.signal.clone();
        let fired = async move {
            loop {
                if *signal.borrow_and_update() {
                    return;
                }
                if signal.changed().await.is_err() {
                    // Handle dropped without cancelling: the signal can never fire.
                    std::future::pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = fired => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => fired.await,
        }
    }

    /// Drives `fut` to completion unless cancellation wins first, in which
    /// case `fut` is dropped.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}

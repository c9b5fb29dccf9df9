use crate::error::PaymentError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Caller-supplied deadline and cancel flag, threaded through every blocking
/// collaborator call of a single request.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    signal: Option<watch::Receiver<bool>>,
}

/// Owning side of a [`Cancellation`] signal.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Cancellation {
    /// A cancellation that never fires.
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a linked handle/cancellation pair.
    pub fn channel() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle(tx),
            Self {
                deadline: None,
                signal: Some(rx),
            },
        )
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn is_canceled(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
            || self.signal.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Runs `fut` unless the request is canceled first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, PaymentError> {
        if self.is_canceled() {
            debug!("Request canceled before collaborator call");
            return Err(PaymentError::Canceled);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        let mut signal = self.signal.clone();
        let canceled = async move {
            match signal.as_mut() {
                Some(rx) => {
                    while !*rx.borrow_and_update() {
                        if rx.changed().await.is_err() {
                            // Sender gone: nobody can cancel anymore.
                            std::future::pending::<()>().await;
                        }
                    }
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = canceled => {
                debug!("Request canceled during collaborator call");
                Err(PaymentError::Canceled)
            }
            _ = deadline => {
                debug!("Request deadline elapsed during collaborator call");
                Err(PaymentError::Canceled)
            }
            out = fut => Ok(out),
        }
    }
}

use std::{sync::Arc, time::Duration};

use tokio::{
    signal::unix::{SignalKind, signal},
    sync::watch,
    time::sleep,
};

use crate::prelude::*;

#[derive(Debug, thiserror::Error)]
#[error("shutdown requested")]
pub struct Cancelled;

/// Externally raised stop flag.
///
/// Takes effect only where it is checked: at loop tops and during sleeps.
#[must_use]
#[derive(Clone)]
pub struct Shutdown(Arc<watch::Sender<bool>>);

impl Default for Shutdown {
    fn default() -> Self {
        Self(Arc::new(watch::Sender::new(false)))
    }
}

impl Shutdown {
    /// Raise the flag on `SIGINT` or `SIGTERM`.
    ///
    /// Per <https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs>.
    pub fn listen() -> Result<Self> {
        let shutdown = Self::default();
        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install the SIGTERM handler")?;
        let mut interrupt =
            signal(SignalKind::interrupt()).context("failed to install the SIGINT handler")?;
        let raiser = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = terminate.recv() => info!("received SIGTERM"),
                _ = interrupt.recv() => info!("received SIGINT"),
            }
            raiser.raise();
        });
        Ok(shutdown)
    }

    pub fn raise(&self) {
        if !self.0.send_replace(true) {
            warn!("shutting down at the next boundary…");
        }
    }

    pub fn is_raised(&self) -> bool {
        *self.0.borrow()
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_raised() { Err(Cancelled) } else { Ok(()) }
    }

    /// Sleep unless the flag gets raised in the meantime.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.check()?;
        let mut receiver = self.0.subscribe();
        tokio::select! {
            () = sleep(duration) => Ok(()),
            _ = receiver.wait_for(|is_raised| *is_raised) => Err(Cancelled),
        }
    }
}

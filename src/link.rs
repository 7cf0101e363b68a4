//! Surviving link outages: reconnect and re-run an operation until it gets through.

mod probe;

use std::{future::Future, io, time::Duration};

use async_trait::async_trait;

pub use self::probe::ProbeLink;
use crate::{prelude::*, shutdown::Shutdown};

/// Transport-level failure. The only error that makes [`Resilient`] retry.
#[derive(Debug, thiserror::Error)]
pub enum ConnectivityError {
    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("transport failure")]
    Transport(#[source] reqwest::Error),

    #[error("host is unreachable")]
    Unreachable(#[source] io::Error),
}

/// Only transport failures convert. Builder, redirect and decoding errors are handed back.
impl TryFrom<reqwest::Error> for ConnectivityError {
    type Error = reqwest::Error;

    fn try_from(error: reqwest::Error) -> Result<Self, Self::Error> {
        if error.is_timeout() {
            Ok(Self::Timeout(error))
        } else if error.is_connect() || error.is_request() || error.is_body() {
            Ok(Self::Transport(error))
        } else {
            Err(error)
        }
    }
}

impl ConnectivityError {
    /// Look for a connectivity failure anywhere in the error chain.
    pub fn is_in(error: &Error) -> bool {
        error.chain().any(|cause| cause.is::<Self>())
    }
}

/// Reconnect primitive.
#[async_trait]
pub trait Link: Send {
    /// Return once the link is up. May reset the interface along the way.
    async fn ensure_connected(&mut self) -> Result;

    /// Forget that the link was up, so that the next [`Link::ensure_connected`] re-checks it.
    fn mark_disconnected(&mut self);
}

/// Runs operations over a flaky link.
pub struct Resilient<L> {
    link: L,
    retry_delay: Duration,
    shutdown: Shutdown,
}

impl<L: Link> Resilient<L> {
    pub const fn new(link: L, retry_delay: Duration, shutdown: Shutdown) -> Self {
        Self { link, retry_delay, shutdown }
    }

    pub async fn run<T, F, Fut>(&mut self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        run_with(&mut self.link, self.retry_delay, &self.shutdown, operation).await
    }
}

/// Invoke the operation from its start until it finishes without a connectivity failure.
///
/// Business failures and successes are returned as is. There is no attempt limit:
/// only the shutdown flag stops the loop.
#[instrument(skip_all, level = Level::DEBUG)]
pub async fn run_with<L, T, F, Fut>(
    link: &mut L,
    retry_delay: Duration,
    shutdown: &Shutdown,
    mut operation: F,
) -> Result<T>
where
    L: Link + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut n_attempt: u64 = 0;
    loop {
        n_attempt += 1;
        shutdown.check()?;
        link.ensure_connected().await?;
        match operation().await {
            Err(error) if ConnectivityError::is_in(&error) => {
                warn!(n_attempt, ?retry_delay, "link failure: {error:#}");
                link.mark_disconnected();
                shutdown.sleep(retry_delay).await?;
            }
            result => return result,
        }
    }
}

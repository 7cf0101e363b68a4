use std::{io, time::Duration};

use async_trait::async_trait;
use bon::Builder;
use tokio::{net::TcpStream, process::Command, time::timeout};

use crate::{
    link::{ConnectivityError, Link},
    prelude::*,
    shutdown::Shutdown,
};

/// Considers the link up when a TCP connection to the probe address succeeds.
///
/// After a number of consecutive failures, runs the reset command (if any),
/// which is expected to bounce the network interface.
#[derive(Builder)]
pub struct ProbeLink {
    #[builder(into)]
    address: String,

    probe_timeout: Duration,
    retry_delay: Duration,
    max_attempts_before_reset: u32,
    reset_command: Option<String>,
    shutdown: Shutdown,

    #[builder(skip)]
    is_connected: bool,

    #[builder(skip)]
    n_failed_attempts: u32,
}

#[async_trait]
impl Link for ProbeLink {
    #[instrument(skip_all, fields(address = %self.address))]
    async fn ensure_connected(&mut self) -> Result {
        while !self.is_connected {
            self.shutdown.check()?;
            match self.probe().await {
                Ok(()) => {
                    info!(n_failed_attempts = self.n_failed_attempts, "link is up");
                    self.is_connected = true;
                    self.n_failed_attempts = 0;
                }
                Err(error) => {
                    self.n_failed_attempts += 1;
                    warn!(
                        n_failed_attempts = self.n_failed_attempts,
                        retry_delay = ?self.retry_delay,
                        "link is down: {:#}",
                        anyhow::Error::from(error),
                    );
                    if self.n_failed_attempts >= self.max_attempts_before_reset {
                        self.reset().await;
                        self.n_failed_attempts = 0;
                    }
                    self.shutdown.sleep(self.retry_delay).await?;
                }
            }
        }
        Ok(())
    }

    fn mark_disconnected(&mut self) {
        self.is_connected = false;
    }
}

impl ProbeLink {
    async fn probe(&self) -> Result<(), ConnectivityError> {
        debug!("probing…");
        match timeout(self.probe_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(error)) => Err(ConnectivityError::Unreachable(error)),
            Err(_) => Err(ConnectivityError::Unreachable(io::ErrorKind::TimedOut.into())),
        }
    }

    /// Bounce the interface. Failures are logged: the probe loop goes on anyway.
    async fn reset(&self) {
        let Some(reset_command) = &self.reset_command else {
            return;
        };
        info!(%reset_command, "resetting the interface…");
        match Command::new("sh").arg("-c").arg(reset_command).status().await {
            Ok(status) if status.success() => info!("interface has been reset"),
            Ok(status) => warn!(%status, "reset command failed"),
            Err(error) => warn!("failed to run the reset command: {error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::{net::TcpListener, time::Instant};

    use super::*;

    fn probe_link(address: String, max_attempts_before_reset: u32) -> ProbeLink {
        ProbeLink::builder()
            .address(address)
            .probe_timeout(Duration::from_secs(5))
            .retry_delay(Duration::from_secs(30))
            .max_attempts_before_reset(max_attempts_before_reset)
            .shutdown(Shutdown::default())
            .build()
    }

    #[tokio::test]
    async fn test_connects_to_listening_socket() -> Result {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let mut link = probe_link(listener.local_addr()?.to_string(), 3);
        link.ensure_connected().await?;
        assert!(link.is_connected);

        link.mark_disconnected();
        assert!(!link.is_connected);
        link.ensure_connected().await?;
        assert!(link.is_connected);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_on_shutdown_while_unreachable() -> Result {
        // Bind and drop to get a port nobody listens on.
        let address = TcpListener::bind("127.0.0.1:0").await?.local_addr()?.to_string();
        let mut link = probe_link(address, u32::MAX);
        let shutdown = link.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(100)).await;
            shutdown.raise();
        });
        let started_at = Instant::now();
        assert!(link.ensure_connected().await.is_err());
        assert!(!link.is_connected);
        assert!(link.n_failed_attempts >= 1);
        assert!(started_at.elapsed() >= Duration::from_secs(100));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_reset_command_after_failed_attempts() -> Result {
        let marker = std::env::temp_dir().join(format!("dormouse-reset-{}", fastrand::u64(..)));
        let address = TcpListener::bind("127.0.0.1:0").await?.local_addr()?.to_string();
        let shutdown = Shutdown::default();
        let mut link = ProbeLink::builder()
            .address(address)
            .probe_timeout(Duration::from_secs(5))
            .retry_delay(Duration::from_secs(30))
            .max_attempts_before_reset(2)
            .reset_command(format!("touch '{}'", marker.display()))
            .shutdown(shutdown.clone())
            .build();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(100)).await;
            shutdown.raise();
        });
        assert!(link.ensure_connected().await.is_err());
        assert!(marker.exists());
        std::fs::remove_file(&marker)?;
        Ok(())
    }
}

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;

use crate::prelude::*;

/// Best-effort operator notifications via a JSON webhook.
pub struct Notifier {
    client: Client,
    url: Option<Url>,
}

#[derive(Serialize)]
struct Message<'a> {
    text: &'a str,
}

impl Notifier {
    pub fn new(url: Option<Url>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;
        Ok(Self { client, url })
    }

    /// Send the text, if the webhook is configured. Failures are only logged.
    pub async fn send(&self, text: &str) {
        if let Some(url) = &self.url
            && let Err(error) = self.send_fallible(url.clone(), text).await
        {
            warn!("failed to send the notification: {error:#}");
        }
    }

    #[instrument(skip_all)]
    async fn send_fallible(&self, url: Url, text: &str) -> Result {
        info!("sending a notification…");
        self.client.post(url).json(&Message { text }).send().await?.error_for_status()?;
        Ok(())
    }
}

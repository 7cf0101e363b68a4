use clap::Parser;
use reqwest::Url;

use crate::{notify::Notifier, prelude::*};

#[derive(Parser)]
pub struct NotifierArgs {
    /// Webhook to post `{"text": …}` messages to on completion and on fatal errors.
    #[clap(long = "notify-url", env = "NOTIFY_URL")]
    pub url: Option<Url>,
}

impl NotifierArgs {
    pub fn new_notifier(&self) -> Result<Notifier> {
        Notifier::new(self.url.clone())
    }
}

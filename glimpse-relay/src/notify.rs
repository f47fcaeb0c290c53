//! Incident notification: sinks and the fire-and-forget dispatcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use glimpse_core::constants::{
    NOTIFICATION_QUEUE_CAPACITY, NOTIFICATION_TIMEOUT_SECONDS, TELEGRAM_API_BASE,
};
use glimpse_core::error::{RelayError, Result};
use glimpse_core::traits::NotificationSink;
use glimpse_core::types::Incident;

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCHER
// ═══════════════════════════════════════════════════════════════════════════════

/// Hands incidents to a sink without making the caller wait.
///
/// Incidents go into a bounded queue drained by a single delivery task,
/// started on the first emit. When the queue is full new incidents are
/// dropped. Delivery failures are logged and never reach the code path
/// that produced the incident.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    queue: Arc<Mutex<Option<mpsc::Sender<Incident>>>>,
    capacity: usize,
}

impl Notifier {
    /// Creates a notifier delivering to `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_capacity(sink, NOTIFICATION_QUEUE_CAPACITY)
    }

    /// Creates a notifier holding at most `capacity` (at least 1) pending incidents.
    pub fn with_capacity(sink: Arc<dyn NotificationSink>, capacity: usize) -> Self {
        Self {
            sink,
            queue: Arc::new(Mutex::new(None)),
            capacity: capacity.max(1),
        }
    }

    /// Creates a notifier that only logs incidents.
    pub fn log_only() -> Self {
        Self::new(Arc::new(LogSink))
    }

    /// Queues `incident` for delivery and returns immediately.
    pub fn emit(&self, incident: Incident) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%incident, "No async runtime, incident dropped");
            return;
        };

        let mut queue = self.queue.lock();
        let tx = queue.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel(self.capacity);
            runtime.spawn(deliver_all(self.sink.clone(), rx));
            tx
        });

        match tx.try_send(incident) {
            Ok(()) => {}
            Err(TrySendError::Full(incident)) => {
                warn!(%incident, "Notification queue full, incident dropped");
            }
            Err(TrySendError::Closed(incident)) => {
                // The worker's runtime is gone; restart on the next emit.
                *queue = None;
                warn!(%incident, "Notification worker stopped, incident dropped");
            }
        }
    }
}

async fn deliver_all(sink: Arc<dyn NotificationSink>, mut rx: mpsc::Receiver<Incident>) {
    while let Some(incident) = rx.recv().await {
        match sink.deliver(&incident).await {
            Ok(()) => debug!("Incident delivered"),
            Err(e) => warn!(error = %e, %incident, "Failed to deliver incident"),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::log_only()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG SINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Sink that writes incidents to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, incident: &Incident) -> Result<()> {
        info!(%incident, "Incident");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TELEGRAM SINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Telegram bot configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Chat receiving the messages
    pub chat_id: String,
    /// Bot API base URL
    pub api_base: String,
}

impl TelegramConfig {
    /// Creates config for the public Bot API.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.into(),
        }
    }

    /// Points the sink at another Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Sink posting incidents to a Telegram chat.
pub struct TelegramSink {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramSink {
    /// Creates a sink for the given bot and chat.
    pub fn with_config(config: TelegramConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(NOTIFICATION_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn deliver(&self, incident: &Incident) -> Result<()> {
        let text = incident.to_string();
        let form = [("chat_id", self.config.chat_id.as_str()), ("text", text.as_str())];

        let response = self
            .http_client
            .post(self.send_message_url())
            .form(&form)
            .send()
            .await
            // reqwest errors embed the URL, which carries the bot token.
            .map_err(|e| RelayError::Notification(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::Notification(format!(
                "Telegram returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

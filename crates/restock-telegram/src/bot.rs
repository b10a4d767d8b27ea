//! Telegram bot connection and inbound dispatcher.

use restock_models::InboundMessage;
use teloxide::dispatching::{DefaultKey, ShutdownToken, UpdateFilterExt};
use teloxide::RequestError;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, TelegramError};
use crate::notifier::TelegramNotifier;

/// The Telegram side of the restock notifier.
pub struct TelegramBot {
    bot: Bot,
}

/// Handle to a running dispatcher.
pub struct DispatcherHandle {
    token: ShutdownToken,
    handle: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Stop receiving updates and wait for the dispatcher to finish.
    ///
    /// A dispatcher that has not started polling yet cannot be shut down
    /// through its token, so its task is aborted instead.
    pub async fn stop(self) {
        match self.token.shutdown() {
            Ok(done) => done.await,
            Err(e) => {
                debug!(error = %e, "dispatcher not running yet, aborting task");
                self.handle.abort();
            }
        }
        match self.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => debug!("dispatcher task aborted"),
            Err(e) => warn!(error = %e, "dispatcher task panicked"),
        }
    }
}

impl TelegramBot {
    /// Create a bot from a Bot API token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Outbound half for the monitor.
    pub fn notifier(&self) -> TelegramNotifier {
        TelegramNotifier::new(self.bot.clone())
    }

    /// Start long polling; every text message is forwarded to `inbound`.
    pub fn spawn_dispatcher(&self, inbound: mpsc::Sender<InboundMessage>) -> DispatcherHandle {
        let mut dispatcher = self.build_dispatcher(inbound);
        let token = dispatcher.shutdown_token();

        info!("Starting Telegram dispatcher in polling mode...");
        let handle = tokio::spawn(async move {
            dispatcher.dispatch().await;
        });

        DispatcherHandle { token, handle }
    }

    fn build_dispatcher(
        &self,
        inbound: mpsc::Sender<InboundMessage>,
    ) -> Dispatcher<Bot, RequestError, DefaultKey> {
        let handler = Update::filter_message().endpoint(move |msg: Message| {
            let inbound = inbound.clone();
            async move {
                if let Some(text) = msg.text() {
                    debug!(chat_id = %msg.chat.id, "message received");
                    let message = InboundMessage::new(msg.chat.id.0.to_string(), text);
                    if inbound.send(message).await.is_err() {
                        warn!(chat_id = %msg.chat.id, "runner is gone, dropping message");
                    }
                }
                respond(())
            }
        });

        Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd.kind);
            })
            .build()
    }
}

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use arrbot_core::chat::next_offset;
use arrbot_core::{Dispatcher, TelegramTransport};

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls Telegram and hands every event to the dispatcher on its own task.
pub struct Poller {
    transport: Arc<TelegramTransport>,
    dispatcher: Arc<Dispatcher>,
}

impl Poller {
    pub fn new(transport: Arc<TelegramTransport>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    /// Runs until the surrounding task is dropped.
    pub async fn run(&self) {
        let mut offset = 0;
        loop {
            let updates = match self.transport.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    error!("Polling failed: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            offset = next_offset(offset, &updates);
            for update in updates {
                let Some(event) = update.into_event() else {
                    continue;
                };
                debug!(chat_id = %event.chat_id(), "Dispatching event");

                let dispatcher = Arc::clone(&self.dispatcher);
                tokio::spawn(async move {
                    if let Err(e) = dispatcher.handle(event).await {
                        error!("Failed to answer chat event: {}", e);
                    }
                });
            }
        }
    }
}

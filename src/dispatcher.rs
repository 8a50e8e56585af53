use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::i18n::{Localizer, Text};
use crate::pending::{PendingCommand, PendingCommands};
use crate::platform::{IncomingMessage, OutgoingMessage};
use crate::store::FilterStore;

/// Top-level bot commands. Only an exact, whole-message match counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    AddFilter,
    ShowFilters,
    RemoveFilter,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            "/addFilter" => Some(Command::AddFilter),
            "/showFilters" => Some(Command::ShowFilters),
            "/removeFilter" => Some(Command::RemoveFilter),
            _ => None,
        }
    }
}

/// Interprets chat messages: runs commands and completes two-step filter edits.
pub struct CommandDispatcher {
    store: Arc<dyn FilterStore>,
    localizer: Arc<dyn Localizer>,
    pending: PendingCommands,
}

impl CommandDispatcher {
    pub fn new(
        store: Arc<dyn FilterStore>,
        localizer: Arc<dyn Localizer>,
        pending: PendingCommands,
    ) -> Self {
        Self {
            store,
            localizer,
            pending,
        }
    }

    /// Handle one incoming message and return the replies to send (possibly none).
    pub async fn handle(&self, incoming: &IncomingMessage) -> Vec<OutgoingMessage> {
        let reply = match Command::parse(&incoming.text) {
            Some(command) => self.run_command(command, incoming).await,
            None => self.complete_pending(incoming).await,
        };

        reply
            .map(|text| vec![OutgoingMessage::new(incoming.chat_id.as_str(), text)])
            .unwrap_or_default()
    }

    async fn run_command(&self, command: Command, incoming: &IncomingMessage) -> Option<String> {
        let chat_id = incoming.chat_id.as_str();
        debug!("Command {:?} from chat {}", command, chat_id);

        match command {
            Command::Start => self.start(incoming).await,
            Command::Help => Some(self.render(incoming, &Text::Help)),
            Command::AddFilter => {
                self.pending
                    .set(chat_id, PendingCommand::AwaitingFilterToAdd)
                    .await;
                Some(self.render(incoming, &Text::AddFilter))
            }
            Command::RemoveFilter => {
                self.pending
                    .set(chat_id, PendingCommand::AwaitingFilterToRemove)
                    .await;
                Some(self.render(incoming, &Text::RemoveFilter))
            }
            Command::ShowFilters => match self.store.list_filters(chat_id).await {
                Ok(filters) if filters.is_empty() => Some(self.render(incoming, &Text::EmptyFilter)),
                Ok(filters) => {
                    let list = filters.display_list();
                    Some(self.render(incoming, &Text::ShowFilter { filters: &list }))
                }
                Err(e) => {
                    error!("Failed to list filters for chat {}: {:#}", chat_id, e);
                    None
                }
            },
        }
    }

    async fn start(&self, incoming: &IncomingMessage) -> Option<String> {
        let Some(user_name) = incoming.user_name.as_deref() else {
            return Some(self.render(incoming, &Text::StartNeedUsername));
        };

        match self
            .store
            .upsert_subscriber(
                &incoming.chat_id,
                user_name,
                incoming.language_code.as_deref(),
            )
            .await
        {
            Ok(created) => {
                if created {
                    info!("New subscriber {} (chat {})", user_name, incoming.chat_id);
                }
                Some(self.render(incoming, &Text::StartSuccess))
            }
            Err(e) => {
                error!("Failed to register chat {}: {:#}", incoming.chat_id, e);
                None
            }
        }
    }

    /// Treat the whole message as the argument of the chat's pending command.
    async fn complete_pending(&self, incoming: &IncomingMessage) -> Option<String> {
        let chat_id = incoming.chat_id.as_str();
        let Some(command) = self.pending.get(chat_id).await else {
            debug!("Ignoring message from chat {}: no pending command", chat_id);
            return None;
        };

        let value = incoming.text.as_str();
        let (result, done) = match command {
            PendingCommand::AwaitingFilterToAdd => {
                (self.store.add_filter(chat_id, value).await, Text::AddedFilter)
            }
            PendingCommand::AwaitingFilterToRemove => (
                self.store.remove_filter(chat_id, value).await,
                Text::RemovedFilter,
            ),
        };

        match result {
            Ok(true) => {
                self.pending.clear(chat_id).await;
                Some(self.render(incoming, &done))
            }
            Ok(false) => {
                warn!(
                    "{:?} for chat {} ignored: no subscriber record",
                    command, chat_id
                );
                None
            }
            Err(e) => {
                error!("Failed to apply {:?} for chat {}: {:#}", command, chat_id, e);
                None
            }
        }
    }

    fn render(&self, incoming: &IncomingMessage, text: &Text<'_>) -> String {
        self.localizer
            .render(incoming.language_code.as_deref(), text)
    }
}

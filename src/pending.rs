use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// A two-step command waiting for its argument in the next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCommand {
    AwaitingFilterToAdd,
    AwaitingFilterToRemove,
}

struct Entry {
    command: PendingCommand,
    started_at: Instant,
}

/// Per-chat pending commands. In memory only, so a restart forgets them.
/// Without a TTL an abandoned entry stays until that chat answers or starts
/// another two-step command; at most one entry is kept per chat.
pub struct PendingCommands {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl PendingCommands {
    /// `ttl = None` (or zero) keeps a pending command until it is answered.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
        }
    }

    /// Start (or replace) the pending command for a chat.
    /// Expired entries of other chats are swept here as well.
    pub async fn set(&self, chat_id: &str, command: PendingCommand) {
        let mut entries = self.entries.lock().await;
        if let Some(ttl) = self.ttl {
            entries.retain(|_, entry| entry.started_at.elapsed() < ttl);
        }
        entries.insert(
            chat_id.to_string(),
            Entry {
                command,
                started_at: Instant::now(),
            },
        );
    }

    /// Current pending command, dropping it first if it has expired
    pub async fn get(&self, chat_id: &str) -> Option<PendingCommand> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(chat_id)?;

        if let Some(ttl) = self.ttl {
            if entry.started_at.elapsed() >= ttl {
                debug!("Pending {:?} for chat {} expired", entry.command, chat_id);
                entries.remove(chat_id);
                return None;
            }
        }

        Some(entry.command)
    }

    pub async fn clear(&self, chat_id: &str) {
        self.entries.lock().await.remove(chat_id);
    }
}

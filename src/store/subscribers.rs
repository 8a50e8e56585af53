use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use super::{FilterSet, FilterStore, SubscriberStore};

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub chat_id: String,
    pub user_name: String,
    pub language_code: Option<String>,
    pub filters: FilterSet,
}

#[cfg(test)]
impl SubscriberStore {
    /// Look up the full subscriber record for a chat
    pub async fn subscriber(&self, chat_id: &str) -> Result<Option<Subscriber>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT chat_id, user_name, language_code, filters
             FROM subscribers WHERE chat_id = ?1",
            rusqlite::params![chat_id],
            |row| {
                let filters: Option<String> = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    filters,
                ))
            },
        )
        .optional()
        .context("Failed to load subscriber")?
        .map(|(chat_id, user_name, language_code, filters)| -> Result<Subscriber> {
            Ok(Subscriber {
                chat_id,
                user_name,
                language_code,
                filters: decode_filters(filters)?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl FilterStore for SubscriberStore {
    async fn upsert_subscriber(
        &self,
        chat_id: &str,
        user_name: &str,
        language_code: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO subscribers (chat_id, user_name, language_code)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![chat_id, user_name, language_code],
            )
            .context("Failed to insert subscriber")?;
        Ok(inserted > 0)
    }

    async fn list_filters(&self, chat_id: &str) -> Result<FilterSet> {
        let conn = self.conn.lock().await;
        Ok(read_filters(&conn, chat_id)?.unwrap_or_default())
    }

    async fn add_filter(&self, chat_id: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        update_filters(&mut conn, chat_id, |filters| {
            filters.insert(value);
        })
    }

    async fn remove_filter(&self, chat_id: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        update_filters(&mut conn, chat_id, |filters| {
            filters.remove(value);
        })
    }
}

/// Read-modify-write of one subscriber's filters inside a transaction.
/// Returns `false` without writing when the subscriber does not exist.
fn update_filters<F>(conn: &mut Connection, chat_id: &str, apply: F) -> Result<bool>
where
    F: FnOnce(&mut FilterSet),
{
    let tx = conn
        .transaction()
        .context("Failed to begin filter transaction")?;

    let Some(mut filters) = read_filters(&tx, chat_id)? else {
        return Ok(false);
    };
    apply(&mut filters);

    tx.execute(
        "UPDATE subscribers SET filters = ?1 WHERE chat_id = ?2",
        rusqlite::params![encode_filters(&filters)?, chat_id],
    )
    .context("Failed to update filters")?;
    tx.commit().context("Failed to commit filter update")?;

    Ok(true)
}

/// `None` when the subscriber is missing, an empty set when it has no filters.
fn read_filters(conn: &Connection, chat_id: &str) -> Result<Option<FilterSet>> {
    let stored: Option<Option<String>> = conn
        .query_row(
            "SELECT filters FROM subscribers WHERE chat_id = ?1",
            rusqlite::params![chat_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read filters")?;

    stored.map(decode_filters).transpose()
}

fn decode_filters(stored: Option<String>) -> Result<FilterSet> {
    match stored {
        Some(json) => serde_json::from_str(&json).context("Corrupt filters column"),
        None => Ok(FilterSet::new()),
    }
}

fn encode_filters(filters: &FilterSet) -> Result<Option<String>> {
    if filters.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(filters)
        .map(Some)
        .context("Failed to encode filters")
}

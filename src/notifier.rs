use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::{error, info};

use crate::i18n::{Localizer, Text};
use crate::platform::Outbound;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Geo {
    pub latitude: f64,
    pub longitude: f64,
}

/// An alert to relay to one subscriber
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub initiator_name: String,
    #[serde(deserialize_with = "chat_id_from_number_or_string")]
    pub chat_id: String,
    pub user_name: String,
    pub language_code: String,
    #[serde(default)]
    pub geo: Option<Geo>,
}

/// Accept `"chatId": 42` as well as `"chatId": "42"`.
fn chat_id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawChatId {
        Number(i64),
        Text(String),
    }

    Ok(match RawChatId::deserialize(deserializer)? {
        RawChatId::Number(n) => n.to_string(),
        RawChatId::Text(s) => s,
    })
}

/// Fixed-point, four decimals, independent of any process locale.
pub fn format_coordinate(value: f64) -> String {
    format!("{:.4}", value)
}

/// Renders notify requests in the subscriber's language and sends them.
pub struct Notifier {
    localizer: Arc<dyn Localizer>,
    outbound: Arc<dyn Outbound>,
}

impl Notifier {
    pub fn new(localizer: Arc<dyn Localizer>, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            localizer,
            outbound,
        }
    }

    pub fn render(&self, request: &NotifyRequest) -> String {
        let language = Some(request.language_code.as_str());
        match request.geo {
            Some(geo) => {
                let latitude = format_coordinate(geo.latitude);
                let longitude = format_coordinate(geo.longitude);
                self.localizer.render(
                    language,
                    &Text::NotifyGeo {
                        initiator: &request.initiator_name,
                        latitude: &latitude,
                        longitude: &longitude,
                    },
                )
            }
            None => self.localizer.render(
                language,
                &Text::Notify {
                    initiator: &request.initiator_name,
                },
            ),
        }
    }

    /// Send the alert. Delivery failures are logged, never returned.
    pub async fn notify(&self, request: &NotifyRequest) {
        let text = self.render(request);
        info!(
            "Notifying {} (chat {}) on behalf of {}",
            request.user_name, request.chat_id, request.initiator_name
        );

        if let Err(e) = self.outbound.send(&request.chat_id, &text).await {
            error!(
                "Error sending message for user {}: {:#}",
                request.user_name, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::FluentLocalizer;
    use crate::platform::testing::{FailingOutbound, RecordingOutbound};
    use crate::platform::OutgoingMessage;

    fn request(geo: Option<Geo>, language_code: &str) -> NotifyRequest {
        NotifyRequest {
            initiator_name: "svc".to_string(),
            chat_id: "42".to_string(),
            user_name: "alice".to_string(),
            language_code: language_code.to_string(),
            geo,
        }
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(12.34567), "12.3457");
        assert_eq!(format_coordinate(-98.76543), "-98.7654");
        assert_eq!(format_coordinate(0.0), "0.0000");
        assert_eq!(format_coordinate(55.75), "55.7500");
    }

    #[tokio::test]
    async fn test_notify_with_geo() {
        let outbound = Arc::new(RecordingOutbound::default());
        let notifier = Notifier::new(Arc::new(FluentLocalizer), outbound.clone());

        let geo = Geo {
            latitude: 12.34567,
            longitude: -98.76543,
        };
        notifier.notify(&request(Some(geo), "en")).await;

        let sent = outbound.messages().await;
        assert_eq!(
            sent,
            vec![OutgoingMessage::new(
                "42",
                FluentLocalizer.render(
                    Some("en"),
                    &Text::NotifyGeo {
                        initiator: "svc",
                        latitude: "12.3457",
                        longitude: "-98.7654",
                    }
                )
            )]
        );
        assert!(sent[0].text.contains("12.3457"));
        assert!(sent[0].text.contains("-98.7654"));
    }

    #[tokio::test]
    async fn test_notify_without_geo() {
        let outbound = Arc::new(RecordingOutbound::default());
        let notifier = Notifier::new(Arc::new(FluentLocalizer), outbound.clone());

        notifier.notify(&request(None, "ru")).await;

        let sent = outbound.messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].text,
            FluentLocalizer.render(Some("ru"), &Text::Notify { initiator: "svc" })
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let outbound = Arc::new(FailingOutbound::default());
        let notifier = Notifier::new(Arc::new(FluentLocalizer), outbound.clone());

        notifier.notify(&request(None, "en")).await;

        assert_eq!(*outbound.attempts.lock().await, 1);
    }

    #[test]
    fn test_request_accepts_numeric_and_string_chat_id() {
        let numeric: NotifyRequest = serde_json::from_str(
            r#"{"initiatorName":"svc","chatId":42,"userName":"alice","languageCode":"en"}"#,
        )
        .unwrap();
        assert_eq!(numeric.chat_id, "42");
        assert!(numeric.geo.is_none());

        let text: NotifyRequest = serde_json::from_str(
            r#"{"initiatorName":"svc","chatId":"-1001","userName":"alice","languageCode":"en",
                "geo":{"latitude":1.5,"longitude":2.25}}"#,
        )
        .unwrap();
        assert_eq!(text.chat_id, "-1001");
        assert_eq!(
            text.geo,
            Some(Geo {
                latitude: 1.5,
                longitude: 2.25
            })
        );
    }

    #[test]
    fn test_request_requires_fields() {
        let missing_user: Result<NotifyRequest, _> =
            serde_json::from_str(r#"{"initiatorName":"svc","chatId":42,"languageCode":"en"}"#);
        assert!(missing_user.is_err());

        let missing_chat: Result<NotifyRequest, _> =
            serde_json::from_str(r#"{"initiatorName":"svc","userName":"a","languageCode":"en"}"#);
        assert!(missing_chat.is_err());
    }
}

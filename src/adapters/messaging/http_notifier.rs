use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    use_cases::subscription_lifecycle::NotificationSender,
};

/// Delivers user notifications through the marketplace messaging API:
/// `POST {base}/admin/users/{userId}/notifications`.
#[derive(Clone)]
pub struct HttpNotificationSender {
    client: Client,
    base_url: Url,
    api_token: Option<SecretString>,
}

impl HttpNotificationSender {
    pub fn new(client: Client, base_url: Url, api_token: Option<SecretString>) -> Self {
        Self {
            client,
            base_url,
            api_token,
        }
    }

    fn endpoint(&self, user_id: i64) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("messaging base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["admin", "users", &user_id.to_string(), "notifications"]);
        Ok(url)
    }
}

#[derive(Serialize)]
struct NotificationReq<'a> {
    title: &'a str,
    message: &'a str,
    #[serde(rename = "type")]
    category: &'a str,
}

#[async_trait]
impl NotificationSender for HttpNotificationSender {
    async fn send_notification(
        &self,
        user_id: i64,
        title: &str,
        body: &str,
        category: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(user_id)?;
        let payload = NotificationReq {
            title,
            message: body,
            category,
        };

        let mut request = self.client.post(url).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        request
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(user_id, error = %e, "Notification request failed");
                AppError::Delivery(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::warn!(user_id, error = %e, "Messaging service rejected notification");
                AppError::Delivery(e.to_string())
            })?;
        Ok(())
    }
}

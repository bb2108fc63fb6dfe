// File: maintainer/src/services/notification_service.rs
use crate::config::EnvSource;
use crate::constants::env_keys;
use crate::errors::NotificationError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delivery channel for operator messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Per-task alert visible only to the operator account
    async fn notify_direct(&self, text: &str) -> Result<(), NotificationError>;

    /// Report or announcement visible to the instance's followers
    async fn notify_broadcast(&self, text: &str) -> Result<(), NotificationError>;
}

/// Note visibility on Misskey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Home,
    Followers,
    Specified,
}

/// Body of `POST /api/notes/create`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub visibility: Visibility,
    pub visible_user_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cw: Option<String>,
    pub local_only: bool,
    pub no_extract_mentions: bool,
    pub no_extract_hashtags: bool,
    pub no_extract_emojis: bool,
    pub text: String,
}

impl NotePayload {
    pub fn new(text: &str, visibility: Visibility, visible_user_ids: Vec<String>) -> Self {
        Self {
            visibility,
            visible_user_ids,
            cw: None,
            local_only: false,
            no_extract_mentions: false,
            no_extract_hashtags: false,
            no_extract_emojis: false,
            text: text.to_string(),
        }
    }
}

/// Where and as whom notes are posted
#[derive(Clone)]
pub struct MisskeySettings {
    /// Scheme and host, e.g. `https://mensis.example`
    pub api_base: String,
    pub token: String,
    /// Recipient of direct notes
    pub target_user_id: Option<String>,
}

impl MisskeySettings {
    /// `None` when the host or token is missing.
    pub fn from_env(env: &dyn EnvSource) -> Option<Self> {
        let host = env.get(env_keys::MISSKEY_HOST).filter(|v| !v.is_empty());
        let token = env
            .get(env_keys::MISSKEY_NOTICE_USER_TOKEN)
            .filter(|v| !v.is_empty());

        let (Some(host), Some(token)) = (host, token) else {
            warn!(
                "{} or {} not found in environment variables",
                env_keys::MISSKEY_HOST,
                env_keys::MISSKEY_NOTICE_USER_TOKEN
            );
            return None;
        };

        let target_user_id = env
            .get(env_keys::MISSKEY_TARGET_USER_ID)
            .or_else(|| env.get(env_keys::MISSKEY_TARGET_USER_ID_LEGACY))
            .filter(|v| !v.is_empty());

        Some(Self {
            api_base: format!("https://{}", host),
            token,
            target_user_id,
        })
    }

    pub fn notes_create_url(&self) -> String {
        format!("{}/api/notes/create", self.api_base.trim_end_matches('/'))
    }
}

/// Posts notifications as Misskey notes.
///
/// Without settings every send is logged and dropped, so a missing token
/// never fails a maintenance task.
#[derive(Clone)]
pub struct MisskeyNotifier {
    settings: Option<MisskeySettings>,
    client: Client,
}

impl MisskeyNotifier {
    pub fn new(settings: Option<MisskeySettings>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { settings, client })
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_some()
    }

    async fn post_note(&self, payload: &NotePayload) -> Result<(), NotificationError> {
        let Some(settings) = &self.settings else {
            debug!("No Misskey settings configured, skipping notification");
            return Ok(());
        };

        let url = settings.notes_create_url();
        info!("Sending notification to Misskey: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&settings.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            info!("Notification sent successfully: {}", status.as_u16());
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl Notifier for MisskeyNotifier {
    async fn notify_direct(&self, text: &str) -> Result<(), NotificationError> {
        let recipients = self
            .settings
            .as_ref()
            .and_then(|s| s.target_user_id.clone())
            .into_iter()
            .collect();
        let payload = NotePayload::new(text, Visibility::Specified, recipients);
        self.post_note(&payload).await
    }

    async fn notify_broadcast(&self, text: &str) -> Result<(), NotificationError> {
        let payload = NotePayload::new(text, Visibility::Home, Vec::new());
        self.post_note(&payload).await
    }
}

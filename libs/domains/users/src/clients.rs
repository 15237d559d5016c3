//! Clients for the Team and Messaging services.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::ServiceClientsConfig;
use crate::error::{UserError, UserResult};

/// The slice of a team record this service needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "teamID", alias = "teamId", alias = "team_id")]
    pub team_id: Uuid,
    #[serde(default)]
    pub name: String,
    /// Recipient list that parents of this team join
    #[serde(rename = "carpoolID", alias = "carpoolId", alias = "carpool_id")]
    pub carpool_id: Uuid,
}

/// Membership of a user in a messaging recipient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientListEntry {
    #[serde(rename = "recipientListID")]
    pub recipient_list_id: Uuid,
    #[serde(rename = "recipientID")]
    pub recipient_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub content: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamClient: Send + Sync {
    async fn get_team(&self, team_id: Uuid, bearer_token: &str) -> UserResult<Team>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn add_recipient(&self, entry: &RecipientListEntry, bearer_token: &str) -> UserResult<()>;

    async fn send_email(&self, message: &EmailMessage) -> UserResult<()>;
}

fn build_client(config: &ServiceClientsConfig) -> UserResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| UserError::Internal(format!("Failed to build HTTP client: {}", e)))
}

async fn ensure_success(service: &str, response: Response) -> UserResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UserError::Upstream(format!("{} returned {}: {}", service, status, body)))
}

fn transport_error(service: &str) -> impl Fn(reqwest::Error) -> UserError + '_ {
    move |e| UserError::Upstream(format!("{} request failed: {}", service, e))
}

/// Team service over HTTP.
#[derive(Clone)]
pub struct HttpTeamClient {
    client: Client,
    base_url: String,
}

impl HttpTeamClient {
    pub fn new(config: &ServiceClientsConfig) -> UserResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.team_service_url.clone(),
        })
    }
}

#[async_trait]
impl TeamClient for HttpTeamClient {
    async fn get_team(&self, team_id: Uuid, bearer_token: &str) -> UserResult<Team> {
        let url = format!("{}/api/team/{}", self.base_url, team_id);
        debug!(%team_id, "Fetching team");

        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(transport_error("team service"))?;

        ensure_success("team service", response)
            .await?
            .json::<Team>()
            .await
            .map_err(|e| UserError::Upstream(format!("team service sent an unreadable team: {}", e)))
    }
}

/// Messaging service over HTTP.
#[derive(Clone)]
pub struct HttpMessagingClient {
    client: Client,
    base_url: String,
}

impl HttpMessagingClient {
    pub fn new(config: &ServiceClientsConfig) -> UserResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.messaging_service_url.clone(),
        })
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    async fn add_recipient(&self, entry: &RecipientListEntry, bearer_token: &str) -> UserResult<()> {
        let url = format!("{}/api/message/recipientlists/create", self.base_url);
        debug!(recipient_list_id = %entry.recipient_list_id, recipient_id = %entry.recipient_id, "Registering recipient");

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer_token)
            .json(entry)
            .send()
            .await
            .map_err(transport_error("messaging service"))?;

        ensure_success("messaging service", response).await?;
        Ok(())
    }

    async fn send_email(&self, message: &EmailMessage) -> UserResult<()> {
        let url = format!("{}/api/message/sendemail", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(message)
            .send()
            .await
            .map_err(transport_error("messaging service"))?;

        ensure_success("messaging service", response).await?;
        Ok(())
    }
}

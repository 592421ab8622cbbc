use std::future::Future;

use podium_deck_interface::{ErrorResponse, Reaction, ReactionRequest, SlideRequest};
use reqwest::StatusCode;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Presenter-only write side of a deck.
pub trait ControlEndpoint: Send + Sync {
    fn publish_slide(&self, slide: u32) -> impl Future<Output = Result<()>> + Send;
}

/// Open write side for audience reactions.
pub trait ReactionEndpoint: Send + Sync {
    fn send_reaction(&self, emoji: &str) -> impl Future<Output = Result<Reaction>> + Send;
}

#[derive(Clone)]
pub struct HttpControlEndpoint {
    client: reqwest::Client,
    url: Url,
    token: Option<String>,
}

impl HttpControlEndpoint {
    pub fn new(client: reqwest::Client, url: Url, token: Option<String>) -> Self {
        Self { client, url, token }
    }

    pub fn from_config(client: reqwest::Client, config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(
            client,
            config.control_url()?,
            config.control_token.clone(),
        ))
    }
}

impl ControlEndpoint for HttpControlEndpoint {
    async fn publish_slide(&self, slide: u32) -> Result<()> {
        let mut request = self.client.post(self.url.clone()).json(&SlideRequest { slide });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        check_status(response).await.map(|_| ())
    }
}

#[derive(Clone)]
pub struct HttpReactionEndpoint {
    client: reqwest::Client,
    url: Url,
}

impl HttpReactionEndpoint {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn from_config(client: reqwest::Client, config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(client, config.reactions_url()?))
    }
}

impl ReactionEndpoint for HttpReactionEndpoint {
    async fn send_reaction(&self, emoji: &str) -> Result<Reaction> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&ReactionRequest {
                emoji: emoji.to_string(),
            })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
        s if s.is_client_error() => {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => s.canonical_reason().unwrap_or("rejected").to_string(),
            };
            Err(ClientError::Rejected {
                status: s.as_u16(),
                message,
            })
        }
        s => Err(ClientError::Transient(format!("server responded {s}"))),
    }
}

//! The five Generation API calls the poller needs, for one country.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::countries::handlers::SectionContent;
use crate::generation::dto::{
    JobStatusView, PendingResponse, ReconcileResponse, StartGenerationResponse,
};
use crate::models::country::SectionKey;
use crate::poller::PollerError;

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn start_generation(&self, section: SectionKey) -> Result<Uuid, PollerError>;

    /// Commits the job as a side effect when it is COMPLETED.
    async fn job_status(&self, job_id: Uuid) -> Result<JobStatusView, PollerError>;

    async fn reconcile(&self) -> Result<ReconcileResponse, PollerError>;

    async fn pending(&self) -> Result<PendingResponse, PollerError>;

    async fn section_content(&self, section: SectionKey) -> Result<Option<String>, PollerError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// `ProfileApi` over HTTP. `base_url` is the API root, e.g. `http://host:8080/api/v1`.
#[derive(Clone)]
pub struct HttpProfileApi {
    client: Client,
    base_url: String,
    country_id: Uuid,
}

impl HttpProfileApi {
    pub fn new(
        base_url: impl Into<String>,
        country_id: Uuid,
        timeout: Duration,
    ) -> Result<Self, PollerError> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            country_id,
        })
    }

    fn country_url(&self, path: &str) -> String {
        format!("{}/countries/{}{}", self.base_url, self.country_id, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PollerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(PollerError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn start_generation(&self, section: SectionKey) -> Result<Uuid, PollerError> {
        let response = self
            .client
            .post(self.country_url("/generations"))
            .json(&json!({ "section": section }))
            .send()
            .await?;
        let started: StartGenerationResponse = Self::decode(response).await?;
        Ok(started.job_id)
    }

    async fn job_status(&self, job_id: Uuid) -> Result<JobStatusView, PollerError> {
        let response = self
            .client
            .get(format!("{}/generations/{job_id}", self.base_url))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn reconcile(&self) -> Result<ReconcileResponse, PollerError> {
        let response = self
            .client
            .get(self.country_url("/generations/reconcile"))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn pending(&self) -> Result<PendingResponse, PollerError> {
        let response = self
            .client
            .get(self.country_url("/generations/pending"))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn section_content(&self, section: SectionKey) -> Result<Option<String>, PollerError> {
        let response = self
            .client
            .get(self.country_url("/profile"))
            .query(&[("section", section.as_str())])
            .send()
            .await?;
        let body: SectionContent = Self::decode(response).await?;
        Ok(body.content)
    }
}

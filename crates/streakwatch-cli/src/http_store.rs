//! [`RecordStore`] backed by a remote `streakwatch server`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use streakwatch_core::{RecordStore, StoreError, TrackerSnapshot};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpStore {
    client: Client,
    url: String,
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::Status(status.as_u16()))
    }
}

impl HttpStore {
    /// Client for the server at `base` (e.g. `http://127.0.0.1:8088`).
    pub fn new(base: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            url: format!("{}/api/v1/streaks", base.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn save(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError> {
        let response = self
            .client
            .put(&self.url)
            .json(snapshot)
            .send()
            .await
            .map_err(transport)?;
        check(response)?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<TrackerSnapshot>, StoreError> {
        let response = self.client.get(&self.url).send().await.map_err(transport)?;
        check(response)?
            .json::<Option<TrackerSnapshot>>()
            .await
            .map_err(transport)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(&self.url)
            .send()
            .await
            .map_err(transport)?;
        check(response)?;
        Ok(())
    }
}

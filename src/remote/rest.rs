//! PostgREST-compatible mirror client.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{RemoteMirror, RemoteTable};
use crate::config::RemoteConfig;
use crate::errors::AppError;
use crate::models::{Flashcard, JournalEntry};

/// REST client speaking the `/rest/v1/{table}` dialect.
pub struct RestMirror {
    client: Client,
    base_url: String,
    key: String,
}

impl RestMirror {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
        })
    }

    fn table_url(&self, table: RemoteTable) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn request(&self, method: Method, table: RemoteTable) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: RemoteTable,
        newest_first: bool,
    ) -> Result<Vec<T>, AppError> {
        let mut request = self.request(Method::GET, table).query(&[("select", "*")]);
        if newest_first {
            request = request.query(&[("order", "id.desc")]);
        }

        let response = check(table, "select", request.send().await?).await?;
        let rows = response.json::<Vec<T>>().await?;
        Ok(rows)
    }
}

/// Turn a non-2xx response into `AppError::Remote` carrying the body.
async fn check(table: RemoteTable, verb: &str, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Remote(format!(
        "{} on {} failed ({}): {}",
        verb, table, status, body
    )))
}

fn id_filter(id: i64) -> String {
    format!("eq.{}", id)
}

#[async_trait]
impl RemoteMirror for RestMirror {
    async fn fetch_logs(&self) -> Result<Vec<JournalEntry>, AppError> {
        self.select(RemoteTable::Logs, true).await
    }

    async fn fetch_cards(&self) -> Result<Vec<Flashcard>, AppError> {
        self.select(RemoteTable::Cards, false).await
    }

    async fn insert(&self, table: RemoteTable, row: Value) -> Result<(), AppError> {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(&vec![row])
            .send()
            .await?;
        check(table, "insert", response).await?;
        Ok(())
    }

    async fn update(&self, table: RemoteTable, id: i64, row: Value) -> Result<(), AppError> {
        let response = self
            .request(Method::PATCH, table)
            .query(&[("id", id_filter(id))])
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        check(table, "update", response).await?;
        Ok(())
    }

    async fn delete(&self, table: RemoteTable, id: i64) -> Result<(), AppError> {
        let response = self
            .request(Method::DELETE, table)
            .query(&[("id", id_filter(id))])
            .send()
            .await?;
        check(table, "delete", response).await?;
        Ok(())
    }
}

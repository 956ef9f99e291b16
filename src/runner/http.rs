use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{
    ComputationRunner, JobHandle, JobProfile, LogPage, ModelDescriptor, RunStatus, RunnerError,
};
use crate::results::{LogLine, RawColumn, RawColumnTable, TableKind};

/// REST client of the remote simulation platform
#[derive(Clone)]
pub struct HttpRunner {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpRunner {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid runner base URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("runner base URL cannot carry a path: {base_url}");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("powerflow-bridge/", env!("CARGO_PKG_VERSION"))),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("runner token contains invalid characters")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { base_url, client })
    }

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RunnerError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| RunnerError::Decode(e.to_string()))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(RunnerError::Unauthorized)
        } else {
            Err(RunnerError::Rejected(format!("HTTP {status}: {body}")))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, RunnerError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        Self::read(resp).await
    }
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    model: &'a str,
    config: &'a Value,
    job: &'a JobProfile,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Deserialize)]
struct WireLogEntry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: WireLogData,
}

#[derive(Deserialize, Default)]
struct WireLogData {
    level: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireTable {
    data: WireTableData,
}

#[derive(Deserialize)]
struct WireTableData {
    #[serde(default)]
    columns: Vec<RawColumn>,
}

#[async_trait]
impl ComputationRunner for HttpRunner {
    async fn fetch_model(&self, rid: &str) -> Result<ModelDescriptor, RunnerError> {
        let url = self.url(["api", "models"].into_iter().chain(rid.split('/')));
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(RunnerError::ModelNotFound(rid.to_string()));
        }
        Self::read(resp).await
    }

    async fn submit(
        &self,
        model: &ModelDescriptor,
        config: &Value,
        job: &JobProfile,
    ) -> Result<JobHandle, RunnerError> {
        let body = SubmitRequest {
            model: &model.rid,
            config,
            job,
        };
        let resp = self
            .client
            .post(self.url(["api", "runs"]))
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        let submitted: SubmitResponse = Self::read(resp).await?;
        Ok(JobHandle(submitted.id))
    }

    async fn status(&self, job: &JobHandle) -> Result<RunStatus, RunnerError> {
        self.get(self.url(["api", "runs", job.0.as_str(), "status"]))
            .await
    }

    async fn logs(&self, job: &JobHandle, since: usize) -> Result<LogPage, RunnerError> {
        let mut url = self.url(["api", "runs", job.0.as_str(), "logs"]);
        url.query_pairs_mut()
            .append_pair("since", &since.to_string());
        let entries: Vec<WireLogEntry> = self.get(url).await?;
        let next_since = since + entries.len();
        let lines = entries
            .into_iter()
            .filter(|e| e.kind.as_deref().map_or(true, |k| k == "log"))
            .map(|e| LogLine {
                level: e.data.level.unwrap_or_else(|| "info".to_string()),
                content: e.data.content.unwrap_or_default(),
            })
            .collect();
        Ok(LogPage { lines, next_since })
    }

    async fn result_table(
        &self,
        job: &JobHandle,
        kind: TableKind,
    ) -> Result<Option<RawColumnTable>, RunnerError> {
        let kind = kind.to_string();
        let tables: Vec<WireTable> = self
            .get(self.url(["api", "runs", job.0.as_str(), "results", kind.as_str()]))
            .await?;
        Ok(tables
            .into_iter()
            .next()
            .map(|t| RawColumnTable::new(t.data.columns)))
    }
}

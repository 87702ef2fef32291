//! HTTP plumbing shared by the Sonarr and Radarr clients (`/api/v3`).

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::connector::{BasicAuth, ConnectorConfig};

use super::{BackendError, CreateOptions};

/// Authenticated access to one backend instance.
pub(crate) struct ArrApi {
    client: Client,
    base_url: String,
    api_key: String,
    basic_auth: Option<BasicAuth>,
}

impl ArrApi {
    pub(crate) fn new(config: &ConnectorConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            basic_auth: config.basic_auth.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, self.url(path))
            .header("X-Api-Key", &self.api_key);

        match &self.basic_auth {
            Some(auth) => request.basic_auth(&auth.username, Some(&auth.password)),
            None => request,
        }
    }

    /// GET `path` and parse the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        debug!(path, ?query, "Backend GET");
        let response = self.request(Method::GET, path).query(query).send().await?;
        let body = read_body(response, |status| status.is_success()).await?;
        parse_body(&body)
    }

    /// POST a JSON body; the backend must answer `201 Created`.
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        debug!(path, "Backend POST");
        let response = self.request(Method::POST, path).json(body).send().await?;
        let body = read_body(response, |status| status == StatusCode::CREATED).await?;
        parse_body(&body)
    }

    /// PUT a JSON body; any success status is accepted.
    pub(crate) async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        debug!(path, "Backend PUT");
        let response = self.request(Method::PUT, path).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }
        Ok(())
    }
}

async fn read_body(
    response: Response,
    accept: impl Fn(StatusCode) -> bool,
) -> Result<String, BackendError> {
    let status = response.status();
    if !accept(status) {
        return Err(status_error(status, response).await);
    }
    Ok(response.text().await?)
}

async fn status_error(status: StatusCode, response: Response) -> BackendError {
    let body = response.text().await.unwrap_or_default();
    BackendError::Status {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Format(e.to_string()))
}

/// Build a create payload: the allow-listed fields of a lookup record plus
/// the per-connector options.
pub(crate) fn create_payload(
    lookup: &Map<String, Value>,
    allowed_fields: &[&str],
    options: &CreateOptions,
) -> Map<String, Value> {
    let mut payload: Map<String, Value> = allowed_fields
        .iter()
        .filter_map(|field| lookup.get(*field).map(|v| (field.to_string(), v.clone())))
        .collect();

    payload.insert(
        "qualityProfileId".to_string(),
        Value::from(options.quality_profile_id),
    );
    payload.insert(
        "rootFolderPath".to_string(),
        Value::from(options.root_dir.clone()),
    );
    payload.insert("monitored".to_string(), Value::Bool(true));
    payload
}

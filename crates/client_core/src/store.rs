//! HTTP implementations of the bills backend capabilities.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::Deserialize;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{CreateBillRequest, CreateBillResponse, RawBill, UpdateBillRequest},
};
use tracing::debug;
use url::Url;

use crate::{error::StoreError, FileFetcher, RemoteStore};

const BILLS_PATH: &str = "bills";

pub struct HttpRemoteStore {
    http: Client,
    api_url: Url,
    jwt: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(api_url: &str, jwt: Option<String>) -> Result<Self, StoreError> {
        let mut api_url =
            Url::parse(api_url).map_err(|e| StoreError::Endpoint(format!("{api_url}: {e}")))?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            api_url,
            jwt,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.api_url
            .join(path)
            .map_err(|e| StoreError::Endpoint(format!("{path}: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.jwt {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<RawBill>, StoreError> {
        let response = self
            .authorize(self.http.get(self.endpoint(BILLS_PATH)?))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn create(&self, request: CreateBillRequest) -> Result<CreateBillResponse, StoreError> {
        debug!(
            file_name = %request.file_name,
            no_content_type = request.no_content_type,
            "uploading receipt"
        );
        let form = Form::new()
            .part(
                "file",
                Part::bytes(request.file_bytes).file_name(request.file_name),
            )
            .text("email", request.email);
        let response = self
            .authorize(self.http.post(self.endpoint(BILLS_PATH)?))
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn update(&self, request: UpdateBillRequest) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("{BILLS_PATH}/{}", request.selector))?;
        let response = self
            .authorize(self.http.patch(url))
            .header(CONTENT_TYPE, "application/json")
            .body(request.data)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

/// Prefers the backend's `ApiError` envelope, then a bare `{message}` body.
fn status_error(status: u16, body: &str) -> StoreError {
    let (code, message) = match serde_json::from_str::<ApiError>(body) {
        Ok(error) => (error.code, error.message),
        Err(_) => (
            ErrorCode::from_status(status),
            serde_json::from_str::<MessageBody>(body)
                .map(|body| body.message)
                .unwrap_or_else(|_| format!("Erreur {status}")),
        ),
    };
    StoreError::Status {
        status,
        code,
        message,
    }
}

#[derive(Default)]
pub struct HttpFileFetcher {
    http: Client,
}

impl HttpFileFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to '{url}' failed"))?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;

//! HTTP client with status classification and request tracing.

use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::status::check_status;
use crate::error::DirectoryError;

/// Thin wrapper over reqwest that speaks JSON in and form data out.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DirectoryError> {
        let response = self.execute(self.client.get(url)).await?;
        read_json(response).await
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, DirectoryError> {
        let response = self.execute(self.client.get(url).query(query)).await?;
        read_json(response).await
    }

    /// POSTs a form and deserializes the JSON response.
    #[tracing::instrument(skip(self, form))]
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        let response = self.execute(self.client.post(url).form(form)).await?;
        read_json(response).await
    }

    /// PUTs a form and deserializes the JSON response.
    #[tracing::instrument(skip(self, form))]
    pub async fn put_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        let response = self.execute(self.client.put(url).form(form)).await?;
        read_json(response).await
    }

    /// POSTs without a body, ignoring whatever the server answers on success.
    #[tracing::instrument(skip(self))]
    pub async fn post_empty(&self, url: &str) -> Result<(), DirectoryError> {
        self.execute(self.client.post(url)).await?;
        Ok(())
    }

    /// Sends the request, traces `METHOD url → status` and classifies failures.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, DirectoryError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.client.execute(request).await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            debug!(
                "{} {} → {} {}",
                method,
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            );
        } else {
            debug!("{} {} → {}", method, url, status.as_u16());
        }

        check_status(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| DirectoryError::Decode(e.to_string()))
}

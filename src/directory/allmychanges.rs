//! AllMyChanges directory implementation.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use log::debug;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::domain::model::{PackageKey, PackageRecord, Tag, VersionRecord};
use crate::error::DirectoryError;
use crate::http::HttpClient;

use super::{PackageFilter, RemoteDirectory, TagFilter, TagStream, VersionFilter};

pub const DEFAULT_BASE_URL: &str = "https://allmychanges.com/v1";

/// AllMyChanges API response types (internal).
mod api {
    use serde::Deserialize;

    /// Listing endpoints answer either with a bare array or with a page object.
    #[derive(Deserialize, Debug)]
    #[serde(untagged)]
    pub enum Listing<T> {
        Page {
            results: Vec<T>,
            #[serde(default)]
            next: Option<String>,
        },
        Plain(Vec<T>),
    }

    impl<T> Listing<T> {
        pub fn into_parts(self) -> (Vec<T>, Option<String>) {
            match self {
                Listing::Page { results, next } => (results, next),
                Listing::Plain(items) => (items, None),
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct Suggestion {
        #[serde(default)]
        pub source: Option<String>,
    }
}

/// Client for the AllMyChanges REST API.
pub struct AllMyChanges {
    http_client: HttpClient,
    base_url: String,
}

impl AllMyChanges {
    /// Create a new directory client with the default API URL.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a new directory client with a custom API URL.
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self::from_http_client(HttpClient::new(client), base_url)
    }

    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolves a record's `resource_uri` (absolute URL or absolute path) plus
    /// an optional action suffix such as `track/`.
    fn resource_url(&self, record: &PackageRecord, suffix: &str) -> Result<String, DirectoryError> {
        if record.resource_uri.is_empty() {
            return Err(DirectoryError::InvalidUrl(format!(
                "package {} has no resource uri",
                record.key()
            )));
        }
        let mut uri = record.resource_uri.clone();
        if !uri.ends_with('/') {
            uri.push('/');
        }
        let url = Url::parse(&self.base_url)
            .and_then(|base| base.join(&uri))
            .and_then(|resource| resource.join(suffix))
            .map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;
        Ok(url.to_string())
    }

    fn listing_url(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Url, DirectoryError> {
        if query.is_empty() {
            return Url::parse(&self.endpoint(path))
                .map_err(|e| DirectoryError::InvalidUrl(e.to_string()));
        }
        Url::parse_with_params(
            &self.endpoint(path),
            query.iter().map(|(key, value)| (*key, value.as_str())),
        )
        .map_err(|e| DirectoryError::InvalidUrl(e.to_string()))
    }

    /// Lazily walks a listing endpoint, following `next` links page by page.
    fn paginate<T>(&self, first: Url) -> BoxStream<'static, Result<T, DirectoryError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let http_client = self.http_client.clone();
        stream::try_unfold((Some(first.to_string()), 0usize), move |(next, page)| {
            let http_client = http_client.clone();
            async move {
                let Some(url) = next else {
                    return Ok::<_, DirectoryError>(None);
                };
                debug!("Fetching page {} from {}...", page + 1, url);
                let listing: api::Listing<T> = http_client.get_json(&url).await?;
                let (items, next) = listing.into_parts();

                let items = stream::iter(items.into_iter().map(Ok::<T, DirectoryError>));
                Ok(Some((items, (next, page + 1))))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn fetch_all<T>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>, DirectoryError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let first = self.listing_url(path, query)?;
        self.paginate(first).try_collect().await
    }
}

/// Converts the service's 400 answers on creation into domain conflicts.
fn creation_conflict(err: DirectoryError, key: &PackageKey, source: &str) -> DirectoryError {
    match &err {
        DirectoryError::Api {
            status: 400,
            message,
            ..
        } => {
            let lower = message.to_lowercase();
            if lower.contains("namespace and name already exists") {
                DirectoryError::AlreadyExists {
                    namespace: key.namespace.clone(),
                    name: key.name.clone(),
                }
            } else if lower.contains("source") && lower.contains("already exists") {
                DirectoryError::SourceAlreadyExists(source.to_string())
            } else {
                err
            }
        }
        _ => err,
    }
}

#[async_trait]
impl RemoteDirectory for AllMyChanges {
    #[tracing::instrument(skip(self))]
    async fn find_packages(
        &self,
        filter: &PackageFilter,
    ) -> Result<Vec<PackageRecord>, DirectoryError> {
        self.fetch_all("/changelogs/", &filter.to_query()).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_package(
        &self,
        key: &PackageKey,
        source: &str,
    ) -> Result<PackageRecord, DirectoryError> {
        let form = [
            ("namespace", key.namespace.as_str()),
            ("name", key.name.as_str()),
            ("source", source),
        ];
        self.http_client
            .post_form(&self.endpoint("/changelogs/"), &form)
            .await
            .map_err(|e| creation_conflict(e, key, source))
    }

    #[tracing::instrument(skip(self, record), fields(package = %record.key()))]
    async fn update_package_source(
        &self,
        record: &PackageRecord,
        source: &str,
    ) -> Result<PackageRecord, DirectoryError> {
        let url = self.resource_url(record, "")?;
        let form = [
            ("namespace", record.namespace.as_str()),
            ("name", record.name.as_str()),
            ("source", source),
        ];
        self.http_client.put_form(&url, &form).await
    }

    #[tracing::instrument(skip(self, record), fields(package = %record.key()))]
    async fn track_package(&self, record: &PackageRecord) -> Result<(), DirectoryError> {
        let url = self.resource_url(record, "track/")?;
        self.http_client.post_empty(&url).await
    }

    #[tracing::instrument(skip(self, record), fields(package = %record.key()))]
    async fn untrack_package(&self, record: &PackageRecord) -> Result<(), DirectoryError> {
        let url = self.resource_url(record, "untrack/")?;
        self.http_client.post_empty(&url).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_versions(
        &self,
        filter: &VersionFilter,
    ) -> Result<Vec<VersionRecord>, DirectoryError> {
        self.fetch_all("/versions/", &filter.to_query()).await
    }

    fn list_tags(&self, filter: &TagFilter) -> TagStream {
        match self.listing_url("/tags/", &filter.to_query()) {
            Ok(first) => self.paginate::<Tag>(first),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    #[tracing::instrument(skip(self, record), fields(package = %record.key()))]
    async fn create_tag(
        &self,
        record: &PackageRecord,
        tag: &str,
        version: &str,
    ) -> Result<(), DirectoryError> {
        let url = self.resource_url(record, "tag/")?;
        let _: serde_json::Value = self
            .http_client
            .post_form(&url, &[("name", tag), ("version", version)])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn guess_source(&self, key: &PackageKey) -> Result<Vec<String>, DirectoryError> {
        let listing: api::Listing<api::Suggestion> = self
            .http_client
            .get_json_with_query(
                &self.endpoint("/search-autocomplete/"),
                &[("q", key.to_string())],
            )
            .await?;

        let mut sources: Vec<String> = Vec::new();
        for source in listing.into_parts().0.into_iter().filter_map(|s| s.source) {
            if !source.is_empty() && !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(sources)
    }
}

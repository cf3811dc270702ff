//! HTTP access to the Market Connect admin backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    domain::{ItemId, SearchRequest},
    error::BackendErrorBody,
    protocol::{
        list_query_pairs, BulkPositionRequest, CategoryDetail, CategoryProduct,
        CategoryProductRemoval, ListPage, PositionUpdate, PositionUpdated, SortParamStyle,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::ClientError,
    list_loader::ListFetcher,
    reconciler::PositionStore,
    reorder::OrderedItem,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A listable admin resource and the query conventions it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub path: String,
    pub sort_style: SortParamStyle,
    /// Sent with every list request, ahead of the filters.
    pub fixed_params: Vec<(String, String)>,
}

impl Resource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sort_style: SortParamStyle::default(),
            fixed_params: Vec::new(),
        }
    }

    pub fn with_sort_style(mut self, sort_style: SortParamStyle) -> Self {
        self.sort_style = sort_style;
        self
    }

    pub fn with_fixed_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fixed_params.push((key.into(), value.into()));
        self
    }

    pub fn orders() -> Self {
        Self::new("admin/orders")
    }

    /// Guest checkouts are excluded from the customer list.
    pub fn customers() -> Self {
        Self::new("admin/customers").with_fixed_param("isGuest", "0")
    }

    pub fn returns() -> Self {
        Self::new("admin/returns").with_sort_style(SortParamStyle::Unsorted)
    }

    pub fn home_layouts() -> Self {
        Self::new("admin/home_layout").with_sort_style(SortParamStyle::OrderBy)
    }

    pub fn query_pairs(&self, request: &SearchRequest) -> Vec<(String, String)> {
        let mut pairs = self.fixed_params.clone();
        pairs.extend(list_query_pairs(request, self.sort_style));
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct AdminApiClient {
    http: Client,
    config: ClientConfig,
}

impl AdminApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                url: config.base_url.to_string(),
                source,
            })?;
        Ok(Self { http, config })
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &Resource,
        request: &SearchRequest,
    ) -> Result<ListPage<T>, ClientError> {
        let url = self.endpoint(&resource.path)?;
        let pairs = resource.query_pairs(request);
        debug!(%url, params = pairs.len(), "GET list");
        let response = self.send(self.http.get(url.clone()).query(&pairs), &url).await?;
        decode(response, &url).await
    }

    pub async fn category(&self, category_id: i64) -> Result<CategoryDetail, ClientError> {
        let url = self.endpoint(&format!("admin/categories/{category_id}"))?;
        let response = self.send(self.http.get(url.clone()), &url).await?;
        decode(response, &url).await
    }

    pub async fn update_product_position(
        &self,
        update: PositionUpdate,
    ) -> Result<Option<PositionUpdated>, ClientError> {
        let url = self.endpoint("admin/categories/product/position")?;
        let response = self
            .send(self.http.put(url.clone()).json(&update), &url)
            .await?;
        Ok(decode_lenient(response, &url).await)
    }

    pub async fn bulk_update_product_positions(
        &self,
        updates: &[PositionUpdate],
    ) -> Result<Vec<PositionUpdated>, ClientError> {
        let url = self.endpoint("admin/categories/product/bulk/position")?;
        let payload = BulkPositionRequest {
            data: updates.to_vec(),
        };
        let response = self
            .send(self.http.put(url.clone()).json(&payload), &url)
            .await?;
        let echoed = match decode_lenient::<PositionEcho>(response, &url).await {
            Some(PositionEcho::Bare(rows)) | Some(PositionEcho::Wrapped { data: rows }) => rows,
            None => Vec::new(),
        };
        Ok(echoed)
    }

    pub async fn remove_category_product(
        &self,
        category_id: i64,
        product_id: ItemId,
    ) -> Result<(), ClientError> {
        let url = self.endpoint("admin/categories/product/delete")?;
        let payload = CategoryProductRemoval {
            category_id,
            product_id,
        };
        self.send(self.http.delete(url.clone()).json(&payload), &url)
            .await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.config.base_url.join(path)?)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ClientError> {
        let request = match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|source| self.transport_error(url, source))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: BackendErrorBody = serde_json::from_str(&body).unwrap_or_default();
        warn!(%url, status = status.as_u16(), "admin backend rejected request");
        Err(ClientError::status(
            status.as_u16(),
            parsed.into_api_error(status.as_u16()),
        ))
    }

    fn transport_error(&self, url: &Url, source: reqwest::Error) -> ClientError {
        if source.is_timeout() {
            ClientError::Timeout(self.config.timeout)
        } else {
            ClientError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ClientError> {
    let bytes = response.bytes().await.map_err(|source| ClientError::Transport {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

/// Write endpoints may answer with an empty body or an unrelated shape.
async fn decode_lenient<T: DeserializeOwned>(response: Response, url: &Url) -> Option<T> {
    let bytes = response.bytes().await.ok()?;
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(%url, error = %err, "ignoring unrecognised write response body");
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionEcho {
    Bare(Vec<PositionUpdated>),
    Wrapped { data: Vec<PositionUpdated> },
}

#[async_trait]
impl<T> ListFetcher<T> for AdminApiClient
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_list(
        &self,
        resource: &Resource,
        request: &SearchRequest,
    ) -> Result<ListPage<T>, ClientError> {
        self.list(resource, request).await
    }
}

/// Position writes for the products of one category.
#[derive(Debug, Clone)]
pub struct CategoryProductPositions {
    client: AdminApiClient,
}

impl CategoryProductPositions {
    pub fn new(client: AdminApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PositionStore for CategoryProductPositions {
    async fn update_position(
        &self,
        update: PositionUpdate,
    ) -> Result<Option<PositionUpdated>, ClientError> {
        self.client.update_product_position(update).await
    }

    async fn bulk_update_positions(
        &self,
        updates: &[PositionUpdate],
    ) -> Result<Vec<PositionUpdated>, ClientError> {
        self.client.bulk_update_product_positions(updates).await
    }
}

/// Category products keyed by their pivot row, as position writes expect.
pub fn ordered_products(detail: CategoryDetail) -> Vec<OrderedItem<CategoryProduct>> {
    detail
        .products
        .into_iter()
        .map(|product| {
            let (id, pivot_id, position) = (product.id, product.pivot.id, product.pivot.position);
            OrderedItem::new(id, position, product).with_pivot(pivot_id)
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

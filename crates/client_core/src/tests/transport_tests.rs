use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{FilterValue, PivotId, SortDir},
    error::ErrorCode,
};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::reconciler::{OrderedCollection, PersistMode};

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    route: &'static str,
    query: Option<String>,
    auth: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct BackendState {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl BackendState {
    async fn record(
        &self,
        route: &'static str,
        query: Option<String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests.lock().await.push(Recorded {
            route,
            query,
            auth,
            body,
        });
    }

    async fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().await.clone()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct OrderRow {
    id: i64,
}

async fn list_orders(
    State(state): State<BackendState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<Value> {
    state.record("orders", query, &headers, None).await;
    Json(json!({ "data": [{ "id": 31 }, { "id": 30 }], "total": 42 }))
}

async fn list_customers(
    State(state): State<BackendState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.record("customers", query, &headers, None).await;
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "message": "maintenance window" })),
    )
}

async fn list_returns() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "data": [], "total": 0 }))
}

async fn category_detail(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "products": [
            { "id": 5, "sku": "SKU-5", "name": { "value": "Boots" }, "pivot": { "id": 905, "position": 1 } },
            { "id": 6, "name": {}, "draft": true, "pivot": { "id": 906, "position": 0 } }
        ]
    }))
}

async fn bulk_position(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.record("bulk_position", None, &headers, Some(body)).await;
    StatusCode::OK
}

async fn single_position(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .record("position", None, &headers, Some(body.clone()))
        .await;
    Json(json!({ "id": body["id"], "pivot_id": body["id"], "position": body["position"] }))
}

async fn remove_product(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.record("remove", None, &headers, Some(body)).await;
    StatusCode::NO_CONTENT
}

async fn spawn_backend() -> anyhow::Result<(String, BackendState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = BackendState::default();
    let app = Router::new()
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/customers", get(list_customers))
        .route("/api/admin/returns", get(list_returns))
        .route("/api/admin/categories/:id", get(category_detail))
        .route(
            "/api/admin/categories/product/bulk/position",
            put(bulk_position),
        )
        .route("/api/admin/categories/product/position", put(single_position))
        .route("/api/admin/categories/product/delete", delete(remove_product))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), state))
}

fn client(base_url: &str) -> AdminApiClient {
    let config = ClientConfig::new(base_url)
        .expect("valid url")
        .with_token("secret-token");
    AdminApiClient::new(config).expect("client")
}

#[test]
fn config_normalises_trailing_slash() {
    let config = ClientConfig::new("https://admin.example.com/api").expect("valid url");
    assert_eq!(config.base_url.as_str(), "https://admin.example.com/api/");
    assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
    assert!(matches!(
        ClientConfig::new("not a url"),
        Err(ClientError::InvalidUrl(_))
    ));
}

#[test]
fn resource_presets_carry_their_conventions() {
    let request = SearchRequest::new(10, Some("name".to_string()), SortDir::Asc);

    let customers = Resource::customers().query_pairs(&request);
    assert_eq!(customers[0], ("isGuest".to_string(), "0".to_string()));

    let layouts = Resource::home_layouts().query_pairs(&request);
    assert!(layouts.contains(&("orderBy".to_string(), "name".to_string())));
    assert!(layouts.contains(&("order".to_string(), "asc".to_string())));

    let returns = Resource::returns().query_pairs(&request);
    assert!(returns.iter().all(|(key, _)| key != "sortBy" && key != "sortDir"));
}

#[tokio::test]
async fn list_sends_one_based_page_and_bearer_token() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    let client = client(&base_url);

    let mut request = SearchRequest::new(25, Some("created_at".to_string()), SortDir::Desc);
    request
        .filters
        .insert("search".to_string(), FilterValue::text("shirt"));

    let page: ListPage<OrderRow> = client
        .list(&Resource::orders(), &request)
        .await
        .expect("list");
    assert_eq!(page.total, 42);
    assert_eq!(page.data, vec![OrderRow { id: 31 }, OrderRow { id: 30 }]);

    let recorded = state.requests().await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded[0].query.as_deref(),
        Some("search=shirt&page=1&perPage=25&sortBy=created_at&sortDir=desc")
    );
    assert_eq!(recorded[0].auth.as_deref(), Some("Bearer secret-token"));
}

#[tokio::test]
async fn error_status_carries_backend_message() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    let client = client(&base_url);

    let err = client
        .list::<OrderRow>(&Resource::customers(), &SearchRequest::default())
        .await
        .expect_err("backend unavailable");
    match err {
        ClientError::Status { status, error } => {
            assert_eq!(status, 503);
            assert_eq!(error.code, ErrorCode::Unavailable);
            assert_eq!(error.message, "maintenance window");
        }
        other => panic!("unexpected error: {other}"),
    }

    let recorded = state.requests().await;
    assert!(recorded[0]
        .query
        .as_deref()
        .is_some_and(|query| query.starts_with("isGuest=0&")));
}

#[tokio::test]
async fn slow_backend_surfaces_timeout() {
    let (base_url, _state) = spawn_backend().await.expect("spawn backend");
    let config = ClientConfig::new(&base_url)
        .expect("valid url")
        .with_timeout(Duration::from_millis(100));
    let client = AdminApiClient::new(config).expect("client");

    let err = client
        .list::<OrderRow>(&Resource::returns(), &SearchRequest::default())
        .await
        .expect_err("timeout");
    assert!(matches!(err, ClientError::Timeout(limit) if limit == Duration::from_millis(100)));
}

#[tokio::test]
async fn category_products_hydrate_in_pivot_order() {
    let (base_url, _state) = spawn_backend().await.expect("spawn backend");
    let detail = client(&base_url).category(12).await.expect("category");
    assert_eq!(detail.id, 12);

    let store: Arc<dyn PositionStore> = Arc::new(FakeStore);
    let collection = OrderedCollection::new(ordered_products(detail), store, PersistMode::PerItem);
    let items = collection.items();
    assert_eq!(items[0].id, ItemId(6));
    assert_eq!(items[0].pivot_id, Some(PivotId(906)));
    assert_eq!(items[0].data.display_name(), "discontinued product");
    assert_eq!(items[1].data.display_name(), "Boots");
}

#[tokio::test]
async fn bulk_save_sends_data_envelope() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    let store: Arc<dyn PositionStore> =
        Arc::new(CategoryProductPositions::new(client(&base_url)));
    let items = vec![
        OrderedItem::new(ItemId(5), 0, "Boots").with_pivot(PivotId(905)),
        OrderedItem::new(ItemId(6), 1, "Sandals").with_pivot(PivotId(906)),
    ];
    let collection = OrderedCollection::from_visual_order(items, store, PersistMode::PerItem);

    collection.bulk_save().await.expect("bulk save");

    let recorded = state.requests().await;
    assert_eq!(recorded[0].route, "bulk_position");
    assert_eq!(
        recorded[0].body,
        Some(json!({ "data": [{ "id": 905, "position": 0 }, { "id": 906, "position": 1 }] }))
    );
}

#[tokio::test]
async fn single_position_write_decodes_echo() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    let echo = client(&base_url)
        .update_product_position(PositionUpdate { id: 906, position: 3 })
        .await
        .expect("update");

    assert_eq!(
        echo,
        Some(PositionUpdated {
            id: 906,
            pivot_id: Some(PivotId(906)),
            position: 3,
        })
    );
    let recorded = state.requests().await;
    assert_eq!(recorded[0].body, Some(json!({ "id": 906, "position": 3 })));
}

#[tokio::test]
async fn remove_product_sends_category_and_product() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    client(&base_url)
        .remove_category_product(12, ItemId(5))
        .await
        .expect("remove");

    let recorded = state.requests().await;
    assert_eq!(
        recorded[0].body,
        Some(json!({ "category_id": 12, "product_id": 5 }))
    );
}

struct FakeStore;

#[async_trait]
impl PositionStore for FakeStore {
    async fn update_position(
        &self,
        _update: PositionUpdate,
    ) -> Result<Option<PositionUpdated>, ClientError> {
        Ok(None)
    }

    async fn bulk_update_positions(
        &self,
        _updates: &[PositionUpdate],
    ) -> Result<Vec<PositionUpdated>, ClientError> {
        Ok(Vec::new())
    }
}

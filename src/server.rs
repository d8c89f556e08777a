use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::{ServeArgs, StoreKind};
use crate::geo::{GeoPoint, NEAREST_LIMIT, NEAREST_MAX_DISTANCE_M, parse_coordinate};
use crate::query::{FieldSchema, ListQuery, Pagination, QueryError};
use crate::seed::load_hospitals;
use crate::store::memory::MemoryStore;
use crate::store::mongo::MongoStore;
use crate::store::{FindOptions, Hospital, HospitalStore, StoreError};

const MSG_INTERNAL: &str = "Internal Server Error";
const MSG_NAME_REQUIRED: &str = "Hospital name is required for search";
const MSG_LOCATION_REQUIRED: &str = "Valid latitude and longitude are required";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn HospitalStore>,
    schema: Arc<FieldSchema>,
}

impl AppState {
    pub fn new(store: Arc<dyn HospitalStore>, schema: FieldSchema) -> Self {
        Self {
            store,
            schema: Arc::new(schema),
        }
    }
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let mut schema = FieldSchema::hospitals();
    for (name, kind) in &opts.filter_fields {
        tracing::info!("extra filter field {}:{}", name, kind);
        schema = schema.with_field(name.clone(), *kind);
    }

    let store: Arc<dyn HospitalStore> = match opts.store {
        StoreKind::Mongo => {
            let store = MongoStore::connect(
                &opts.mongo.uri,
                &opts.mongo.database,
                &opts.mongo.collection,
            )
            .await
            .context("connect to mongodb")?;
            store
                .ensure_indexes()
                .await
                .context("create 2dsphere index")?;
            tracing::info!(
                "Using MongoDB collection {}.{}",
                opts.mongo.database,
                opts.mongo.collection
            );
            Arc::new(store)
        }
        StoreKind::Memory => {
            let path = opts
                .data_file
                .as_deref()
                .ok_or_else(|| anyhow!("--data-file is required with --store memory"))?;
            let store = MemoryStore::new(load_hospitals(Path::new(path))?);
            tracing::info!("Loaded {} hospitals into memory from {}", store.len(), path);
            Arc::new(store)
        }
    };

    let app = router(AppState::new(store, schema));

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(api_health))
        .route("/api/v1/hospitals", get(api_list_hospitals))
        .route("/api/v1/hospitals/nearest", post(api_nearest_hospitals))
        .route("/api/v1/hospitals/search", get(api_search_hospitals))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Every failure is reported as `{success: false, msg}`. Store failures are
/// logged and hidden behind a generic message.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    msg: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Query(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Store(e) => {
                tracing::error!("{} (error)", e);
                (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL.to_string())
            }
        };
        (status, Json(ErrorBody { success: false, msg })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    success: bool,
}

async fn api_health() -> impl IntoResponse {
    Json(HealthResponse { success: true })
}

#[derive(Debug, Serialize)]
struct HospitalsResponse {
    success: bool,
    data: Vec<Hospital>,
}

#[derive(Debug, Deserialize)]
struct NearestRequest {
    location: Option<LocationBody>,
}

#[derive(Debug, Deserialize)]
struct LocationBody {
    latitude: Option<Value>,
    longitude: Option<Value>,
}

impl NearestRequest {
    fn point(&self) -> Option<GeoPoint> {
        let loc = self.location.as_ref()?;
        let lat = parse_coordinate(loc.latitude.as_ref()?)?;
        let lon = parse_coordinate(loc.longitude.as_ref()?)?;
        GeoPoint::new(lat, lon)
    }
}

async fn api_nearest_hospitals(
    State(st): State<AppState>,
    body: Result<Json<NearestRequest>, JsonRejection>,
) -> Result<Json<HospitalsResponse>, ApiError> {
    let point = body
        .ok()
        .and_then(|Json(req)| req.point())
        .ok_or_else(|| ApiError::BadRequest(MSG_LOCATION_REQUIRED.to_string()))?;

    let data = st
        .store
        .find_near(point, NEAREST_MAX_DISTANCE_M, NEAREST_LIMIT)
        .await?;
    Ok(Json(HospitalsResponse {
        success: true,
        data,
    }))
}

/// The first `name` parameter is the search term; repeats are ignored.
async fn api_search_hospitals(
    State(st): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<HospitalsResponse>, ApiError> {
    let name = params.ok().and_then(|Query(params)| {
        params
            .into_iter()
            .find(|(k, _)| k == "name")
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
    });
    let Some(name) = name else {
        return Err(ApiError::BadRequest(MSG_NAME_REQUIRED.to_string()));
    };
    let data = st.store.search_name(&name).await?;
    Ok(Json(HospitalsResponse {
        success: true,
        data,
    }))
}

#[derive(Debug, Serialize)]
struct ListResponse {
    success: bool,
    count: u64,
    pagination: Pagination,
    data: Vec<Hospital>,
}

async fn api_list_hospitals(
    State(st): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = ListQuery::from_params(&params, &st.schema)?;

    let total = st.store.count(&query.filter).await?;
    let pagination = query.page.pagination(total);

    let opts = FindOptions {
        projection: query.projection,
        sort: query.sort,
        skip: query.page.start_index(),
        limit: query.page.limit,
    };
    let data = st.store.find(&query.filter, &opts).await?;

    Ok(Json(ListResponse {
        success: true,
        count: total,
        pagination,
        data,
    }))
}

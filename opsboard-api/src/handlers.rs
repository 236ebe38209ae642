//! API route handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, warn};

use opsboard_core::types::{
    Aggregate, AuditEvent, DirectoryUser, DomainRecord, NewUser, Record,
};
use opsboard_inventory::{users_key, DOMAINS_KEY, INFRA_KEY, USERS_FAMILY};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Actor recorded on audit entries until authentication lands.
const ACTOR: &str = "system";

/// Records an audit entry, logging instead of failing the request: the
/// provider mutation has already been applied at this point.
async fn audit(state: &AppState, event: AuditEvent) {
    if let Err(err) = state.audit.record(event).await {
        warn!(error = %err, "Failed to record audit entry");
    }
}

/// GET /api/domains
pub async fn list_domains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DomainRecord>>> {
    let st = state.clone();
    let aggregate = state
        .queries
        .get_or_compute(DOMAINS_KEY, None, || async move {
            let domains = st.directory.get_domains().await?;
            Ok(Aggregate::from_records(
                domains.into_iter().map(Record::from).collect(),
            ))
        })
        .await?;

    let domains: Vec<DomainRecord> = aggregate
        .items
        .iter()
        .filter_map(|record| record.decode().ok())
        .collect();

    Ok(Json(domains))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UsersQuery>,
) -> Result<Json<UserListResponse>> {
    let key = users_key(params.domain.as_deref());

    let st = state.clone();
    let aggregate = state
        .queries
        .get_or_compute(&key, None, || async move {
            let users = st.directory.get_users(params.domain.as_deref()).await?;
            Ok(Aggregate::from_records(
                users.into_iter().map(Record::from).collect(),
            ))
        })
        .await?;

    let users: Vec<DirectoryUser> = aggregate
        .items
        .iter()
        .filter_map(|record| record.decode().ok())
        .collect();

    Ok(Json(UserListResponse {
        users,
        total: aggregate.total,
        monthly_cost: aggregate.monthly_cost,
    }))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewUser>,
) -> Result<Json<DirectoryUser>> {
    let user = state.directory.create_user(&request).await?;

    state.queries.invalidate_family(USERS_FAMILY);
    audit(
        &state,
        AuditEvent::new(
            "create_user",
            "user",
            user.id.clone(),
            ACTOR,
            format!("Created user {}", user.email),
        ),
    )
    .await;

    info!(id = %user.id, email = %user.email, "User created");
    Ok(Json(user))
}

/// POST /api/users/:user_id/disable
pub async fn disable_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ActionResponse>> {
    state.directory.disable_user(&user_id).await?;

    state.queries.invalidate_family(USERS_FAMILY);
    audit(
        &state,
        AuditEvent::new(
            "disable_user",
            "user",
            user_id.clone(),
            ACTOR,
            format!("Disabled user {user_id}"),
        ),
    )
    .await;

    Ok(Json(ActionResponse {
        success: true,
        message: "User disabled successfully".into(),
    }))
}

/// DELETE /api/users/:user_id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ActionResponse>> {
    state.directory.delete_user(&user_id).await?;

    state.queries.invalidate_family(USERS_FAMILY);
    audit(
        &state,
        AuditEvent::new(
            "delete_user",
            "user",
            user_id.clone(),
            ACTOR,
            format!("Deleted user {user_id}"),
        ),
    )
    .await;

    Ok(Json(ActionResponse {
        success: true,
        message: "User deleted successfully".into(),
    }))
}

/// GET /api/infrastructure
pub async fn list_infrastructure(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InfrastructureResponse>> {
    let st = state.clone();
    let aggregate = state
        .queries
        .get_or_compute(INFRA_KEY, None, || async move {
            // Best-effort fan-out: provider failures degrade to partial data.
            Ok(st.aggregator.collect(None).await)
        })
        .await?;

    Ok(Json(InfrastructureResponse {
        total: aggregate.total,
        monthly_cost: aggregate.monthly_cost,
        items: aggregate.items.into_iter().map(InfraItemDto::from).collect(),
    }))
}

/// POST /api/analyze-users
pub async fn analyze_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyzeResponse>> {
    // Read the directory directly: recommendations about cached data would
    // lag behind mutations made since the last miss.
    let users = state.directory.get_users(None).await?;
    let analysis = state.advisor.analyze_users(&users).await?;

    Ok(Json(AnalyzeResponse {
        response: analysis.response,
        recommendations: analysis.recommendations,
    }))
}

/// POST /api/ask
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let response = state
        .advisor
        .ask(&request.question, request.context.as_ref())
        .await?;

    Ok(Json(AskResponse { response }))
}

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    Json(state.queries.stats().into())
}

/// POST /api/cache/clear
pub async fn cache_clear(State(state): State<Arc<AppState>>) -> Json<ActionResponse> {
    state.queries.clear_all();
    info!("Query cache cleared");

    Json(ActionResponse {
        success: true,
        message: "Cache cleared".into(),
    })
}

/// GET /api/audit
pub async fn list_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
) -> Result<Json<AuditListResponse>> {
    let limit = params.limit.unwrap_or(50);
    let entries = state.audit.recent(limit).await.map_err(ApiError::from)?;
    let total = state.audit.count().await.map_err(ApiError::from)?;

    Ok(Json(AuditListResponse { entries, total }))
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let start = START_TIME.get_or_init(Instant::now);

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: start.elapsed().as_secs(),
        cache_entries: state.queries.stats().total_entries,
    })
}

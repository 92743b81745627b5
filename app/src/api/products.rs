use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    entity::review,
    params::{Json, Path, Query, Valid},
    service::catalog::{
        self, CreatePartInput, CreatedParts, PartFilters, PartView, ProductPage, ReviewInput,
        UpdatePartInput,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/groups/companies", get(companies))
        .route("/groups/models", get(models))
        .route("/groups/brands", get(brands))
        .route("/groups/types", get(types))
        .route("/{id}", get(get_part).put(update_part).delete(delete_part))
        .route("/{id}/reviews", post(add_review))
}

#[derive(Debug, Deserialize)]
struct CompanyQuery {
    #[serde(default)]
    company: String,
}

async fn list_parts(
    State(state): State<AppState>,
    Query(filters): Query<PartFilters>,
) -> ApiResult<ApiResponse<ProductPage>> {
    let page = catalog::list_parts(&state.db, &filters).await?;

    Ok(ApiResponse::ok("products", Some(page)))
}

async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<PartView>> {
    let part = catalog::get_part(&state.db, id).await?;

    Ok(ApiResponse::ok("product", Some(part)))
}

async fn create_part(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<CreatePartInput>>,
) -> ApiResult<ApiResponse<CreatedParts>> {
    let created = catalog::create_part(&state.db, &actor, input).await?;

    Ok(ApiResponse::created("Product created", created))
}

async fn update_part(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
    Valid(Json(input)): Valid<Json<UpdatePartInput>>,
) -> ApiResult<ApiResponse<PartView>> {
    let part = catalog::update_part(&state.db, &actor, id, input).await?;

    Ok(ApiResponse::ok("Product updated", Some(part)))
}

async fn delete_part(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<()>> {
    catalog::delete_part(&state.db, &actor, id).await?;

    Ok(ApiResponse::ok("Deleted", None))
}

async fn add_review(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
    Valid(Json(input)): Valid<Json<ReviewInput>>,
) -> ApiResult<ApiResponse<review::Model>> {
    let review = catalog::add_review(&state.db, &actor, id, input).await?;

    Ok(ApiResponse::created("Review added", review))
}

async fn companies(State(state): State<AppState>) -> ApiResult<ApiResponse<Value>> {
    let companies = catalog::distinct_companies(&state.db).await?;

    Ok(ApiResponse::ok("companies", Some(json!({ "companies": companies }))))
}

async fn models(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<ApiResponse<Value>> {
    let models = catalog::distinct_models(&state.db, &query.company).await?;

    Ok(ApiResponse::ok(
        "models",
        Some(json!({ "company": query.company.trim(), "models": models })),
    ))
}

async fn brands(State(state): State<AppState>) -> ApiResult<ApiResponse<Value>> {
    let brands = catalog::distinct_brands(&state.db).await?;

    Ok(ApiResponse::ok("brands", Some(json!({ "brands": brands }))))
}

async fn types(State(state): State<AppState>) -> ApiResult<ApiResponse<Value>> {
    let types = catalog::distinct_types(&state.db).await?;

    Ok(ApiResponse::ok("types", Some(json!({ "types": types }))))
}

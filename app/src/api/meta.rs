use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    entity::{company_meta, model_meta},
    params::{Json, Query, Valid},
    service::meta::{self, CompanyMetaInput, ModelMetaInput},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies).post(upsert_company))
        .route("/models", get(list_models).post(upsert_model))
}

#[derive(Debug, Deserialize)]
struct CompanyQuery {
    #[serde(default)]
    company: String,
}

async fn list_companies(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<company_meta::Model>>> {
    let companies = meta::list_companies(&state.db).await?;

    Ok(ApiResponse::ok("companies", Some(companies)))
}

async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<ApiResponse<Vec<model_meta::Model>>> {
    let models = meta::list_models(&state.db, &query.company).await?;

    Ok(ApiResponse::ok("models", Some(models)))
}

async fn upsert_company(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<CompanyMetaInput>>,
) -> ApiResult<ApiResponse<company_meta::Model>> {
    let saved = meta::upsert_company(&state.db, &actor, input).await?;

    Ok(ApiResponse::created("Company saved", saved))
}

async fn upsert_model(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<ModelMetaInput>>,
) -> ApiResult<ApiResponse<model_meta::Model>> {
    let saved = meta::upsert_model(&state.db, &actor, input).await?;

    Ok(ApiResponse::created("Model saved", saved))
}

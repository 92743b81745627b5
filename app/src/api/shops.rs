use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    params::{Json, Path, Query, Valid},
    service::shops::{self, NewShop, ShopQuery, ShopUpdate, ShopView},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shops).post(create_shop))
        .route("/me", get(get_my_shop).put(update_my_shop))
        .route(
            "/{id}",
            get(get_shop).put(update_shop).delete(delete_shop),
        )
}

#[derive(Debug, Default, Deserialize)]
struct MyShopQuery {
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    id: Option<i32>,
}

async fn list_shops(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<ShopQuery>>,
) -> ApiResult<ApiResponse<Vec<ShopView>>> {
    let shops = shops::list_shops(&state.db, &query).await?;

    Ok(ApiResponse::ok("shops", Some(shops)))
}

async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<ShopView>> {
    let shop = shops::get_shop(&state.db, id).await?;

    Ok(ApiResponse::ok("shop", Some(shop)))
}

/// Administrators pass `?id=` to pick the shop.
async fn get_my_shop(
    State(state): State<AppState>,
    actor: Identity,
    Query(query): Query<MyShopQuery>,
) -> ApiResult<ApiResponse<ShopView>> {
    let shop = shops::get_my_shop(&state.db, &actor, query.id).await?;

    Ok(ApiResponse::ok("shop", Some(shop)))
}

async fn update_my_shop(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(update)): Valid<Json<ShopUpdate>>,
) -> ApiResult<ApiResponse<ShopView>> {
    let shop = shops::update_my_shop(&state.db, &actor, update).await?;

    Ok(ApiResponse::ok("Shop updated", Some(shop)))
}

async fn create_shop(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<NewShop>>,
) -> ApiResult<ApiResponse<ShopView>> {
    let shop = shops::create_shop(&state.db, &actor, input).await?;

    Ok(ApiResponse::created("Shop created", shop))
}

async fn update_shop(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
    Valid(Json(update)): Valid<Json<ShopUpdate>>,
) -> ApiResult<ApiResponse<ShopView>> {
    let shop = shops::update_shop(&state.db, &actor, id, update).await?;

    Ok(ApiResponse::ok("Shop updated", Some(shop)))
}

async fn delete_shop(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<()>> {
    shops::delete_shop(&state.db, &actor, id).await?;

    Ok(ApiResponse::ok("Deleted", None))
}

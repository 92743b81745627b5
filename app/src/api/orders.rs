use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    params::{Json, Path, Valid},
    service::orders::{self, CreateOrderInput, OrderView},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/my/list", get(my_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/pay", put(pay_order))
        .route("/{id}/deliver", put(deliver_order))
}

async fn create_order(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<CreateOrderInput>>,
) -> ApiResult<ApiResponse<OrderView>> {
    let order = orders::create_order(&state.db, &state.sms, &actor, input).await?;

    Ok(ApiResponse::created("Order created", order))
}

async fn get_order(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<OrderView>> {
    let order = orders::get_order(&state.db, &actor, id).await?;

    Ok(ApiResponse::ok("order", Some(order)))
}

async fn pay_order(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<OrderView>> {
    let order = orders::pay_order(&state.db, &actor, id).await?;

    Ok(ApiResponse::ok("Order paid", Some(order)))
}

async fn my_orders(
    State(state): State<AppState>,
    actor: Identity,
) -> ApiResult<ApiResponse<Vec<OrderView>>> {
    let orders = orders::my_orders(&state.db, &actor).await?;

    Ok(ApiResponse::ok("orders", Some(orders)))
}

async fn deliver_order(
    State(state): State<AppState>,
    actor: Identity,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<OrderView>> {
    let order = orders::deliver_order(&state.db, &actor, id).await?;

    Ok(ApiResponse::ok("Order delivered", Some(order)))
}

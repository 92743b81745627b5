use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    params::{Json, Valid},
    service::{
        shops::{self, ShopView},
        users::{self, ResetPasswordInput, UserView, VendorInput},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/reset-password", post(reset_password))
        .route("/vendors/create", post(create_vendor))
}

#[derive(Debug, Serialize)]
pub struct ProvisionedVendor {
    pub vendor: UserView,
    pub shop: ShopView,
}

async fn list_users(
    State(state): State<AppState>,
    actor: Identity,
) -> ApiResult<ApiResponse<Vec<UserView>>> {
    actor.require_admin()?;

    let users = users::list_users(&state.db).await?;

    Ok(ApiResponse::ok("users", Some(users)))
}

async fn create_vendor(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<VendorInput>>,
) -> ApiResult<ApiResponse<ProvisionedVendor>> {
    actor.require_admin()?;

    let (vendor, shop) = users::create_vendor(&state.db, &state.passwords, input).await?;
    let shop = shops::get_shop(&state.db, shop.id).await?;

    Ok(ApiResponse::created(
        "Vendor created",
        ProvisionedVendor {
            vendor: UserView::from(&vendor),
            shop,
        },
    ))
}

async fn reset_password(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<ResetPasswordInput>>,
) -> ApiResult<ApiResponse<UserView>> {
    actor.require_admin()?;

    let user = users::reset_password(&state.db, &state.passwords, input).await?;

    Ok(ApiResponse::ok("Password updated", Some(UserView::from(&user))))
}

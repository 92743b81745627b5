use axum::{
    Router,
    extract::State,
    routing::{post, put},
};
use serde::Serialize;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    entity::user,
    params::{Json, Valid},
    service::users::{self, LoginInput, ProfileInput, RegisterInput, UserView},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/admin/create", post(admin_create))
        .route("/login", post(login))
        .route("/profile", put(update_profile))
}

#[derive(Debug, Serialize)]
pub struct AuthView {
    pub token: String,
    pub user: UserView,
}

fn issue(state: &AppState, user: &user::Model) -> ApiResult<AuthView> {
    let token = state.jwt.encode(&Identity::from(user))?;

    Ok(AuthView {
        token,
        user: UserView::from(user),
    })
}

/// Open to everyone; the requested role only counts when an administrator is calling.
async fn register(
    State(state): State<AppState>,
    actor: Option<Identity>,
    Valid(Json(input)): Valid<Json<RegisterInput>>,
) -> ApiResult<ApiResponse<AuthView>> {
    let user = users::register(&state.db, &state.passwords, actor.as_ref(), input).await?;

    Ok(ApiResponse::created("User registered", issue(&state, &user)?))
}

async fn admin_create(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<RegisterInput>>,
) -> ApiResult<ApiResponse<AuthView>> {
    actor.require_admin()?;

    let user = users::register(&state.db, &state.passwords, Some(&actor), input).await?;

    Ok(ApiResponse::created("User created", issue(&state, &user)?))
}

async fn login(
    State(state): State<AppState>,
    Valid(Json(input)): Valid<Json<LoginInput>>,
) -> ApiResult<ApiResponse<AuthView>> {
    let user = users::login(&state.db, &state.passwords, input).await?;

    Ok(ApiResponse::ok("Login successful", Some(issue(&state, &user)?)))
}

/// Returns a fresh token, since name and email travel inside it.
async fn update_profile(
    State(state): State<AppState>,
    actor: Identity,
    Valid(Json(input)): Valid<Json<ProfileInput>>,
) -> ApiResult<ApiResponse<AuthView>> {
    let user = users::update_profile(&state.db, &state.passwords, &actor, input).await?;

    Ok(ApiResponse::ok("Profile updated", Some(issue(&state, &user)?)))
}

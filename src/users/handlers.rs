use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{
        CreateUserRequest, ListUsersResponse, LoginRequest, LoginResponse, PublicUser,
        UpdateUserRequest, UserIdRequest,
    },
    services::UserService,
};
use crate::{
    error::AppResult,
    rpc::{Empty, RpcJson},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/rpc/UserService/CreateUser", post(create_user))
        .route("/rpc/UserService/GetUser", post(get_user))
        .route("/rpc/UserService/UpdateUser", post(update_user))
        .route("/rpc/UserService/DeleteUser", post(delete_user))
        .route("/rpc/UserService/ListUsers", post(list_users))
        .route("/rpc/UserService/Login", post(login))
}

#[instrument(skip(users, req))]
pub async fn create_user(
    State(users): State<UserService>,
    RpcJson(req): RpcJson<CreateUserRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = users.register(req.email, req.password, req.full_name).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(users))]
pub async fn get_user(
    State(users): State<UserService>,
    RpcJson(req): RpcJson<UserIdRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = users.get(&req.id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(users, req))]
pub async fn update_user(
    State(users): State<UserService>,
    RpcJson(req): RpcJson<UpdateUserRequest>,
) -> AppResult<Json<PublicUser>> {
    let (id, patch) = req.into_parts();
    let user = users.update(&id, patch).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(users))]
pub async fn delete_user(
    State(users): State<UserService>,
    RpcJson(req): RpcJson<UserIdRequest>,
) -> AppResult<Json<Empty>> {
    users.delete(&req.id).await?;
    Ok(Json(Empty {}))
}

#[instrument(skip(users))]
pub async fn list_users(State(users): State<UserService>) -> AppResult<Json<ListUsersResponse>> {
    let users = users.list().await?;
    Ok(Json(ListUsersResponse {
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

#[instrument(skip(users, req))]
pub async fn login(
    State(users): State<UserService>,
    RpcJson(req): RpcJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = users.login(req.email, req.password).await?;
    Ok(Json(LoginResponse { token }))
}

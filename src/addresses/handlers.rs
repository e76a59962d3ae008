use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{
        AddressIdRequest, CreateAddressRequest, ListAddressRequest, ListAddressResponse,
        UpdateAddressRequest,
    },
    repo_types::Address,
    services::AddressService,
};
use crate::{
    error::AppResult,
    rpc::{Empty, RpcJson},
    state::AppState,
};

pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/rpc/AddressService/CreateAddress", post(create_address))
        .route("/rpc/AddressService/GetAddress", post(get_address))
        .route("/rpc/AddressService/UpdateAddress", post(update_address))
        .route("/rpc/AddressService/DeleteAddress", post(delete_address))
        .route("/rpc/AddressService/ListAddress", post(list_address))
}

#[instrument(skip(addresses))]
pub async fn create_address(
    State(addresses): State<AddressService>,
    RpcJson(req): RpcJson<CreateAddressRequest>,
) -> AppResult<Json<Address>> {
    let addr = addresses.create(req.into()).await?;
    Ok(Json(addr))
}

#[instrument(skip(addresses))]
pub async fn get_address(
    State(addresses): State<AddressService>,
    RpcJson(req): RpcJson<AddressIdRequest>,
) -> AppResult<Json<Address>> {
    Ok(Json(addresses.get_by_id(&req.id).await?))
}

#[instrument(skip(addresses))]
pub async fn update_address(
    State(addresses): State<AddressService>,
    RpcJson(req): RpcJson<UpdateAddressRequest>,
) -> AppResult<Json<Address>> {
    let (id, input) = req.into_parts();
    Ok(Json(addresses.update(&id, input).await?))
}

#[instrument(skip(addresses))]
pub async fn delete_address(
    State(addresses): State<AddressService>,
    RpcJson(req): RpcJson<AddressIdRequest>,
) -> AppResult<Json<Empty>> {
    addresses.delete(&req.id).await?;
    Ok(Json(Empty {}))
}

#[instrument(skip(addresses))]
pub async fn list_address(
    State(addresses): State<AddressService>,
    RpcJson(req): RpcJson<ListAddressRequest>,
) -> AppResult<Json<ListAddressResponse>> {
    let page = addresses.list(req.page, req.limit).await?;
    Ok(Json(page.into()))
}

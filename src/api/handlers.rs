use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;

use crate::{
    errors::CustomError,
    models::{
        api_response::{created_response, success_response},
        requests::{AddressValidation, ManualAddressRequest, OpenSessionRequest, SwitchNetworkRequest},
        session::WalletConnection,
    },
    services::{address::validate_address, session_service::SessionService},
};

#[get("/networks")]
async fn list_networks(service: web::Data<SessionService>) -> HttpResponse {
    success_response(service.networks())
}

#[get("/addresses/{address}/validate")]
async fn check_address(address: web::Path<String>) -> HttpResponse {
    let address = address.into_inner();
    success_response(AddressValidation {
        valid: validate_address(&address),
        address,
    })
}

/// The body is optional; an empty one opens a session on the default network.
#[post("/sessions")]
async fn open_session(
    service: web::Data<SessionService>,
    body: web::Bytes,
) -> Result<HttpResponse, CustomError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        OpenSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| CustomError::ValidationError(format!("Invalid request body: {}", e)))?
    };
    let view = service.open_session(request)?;
    Ok(created_response(view))
}

#[get("/sessions/{id}")]
async fn get_session(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    Ok(success_response(service.view(id.into_inner())?))
}

#[delete("/sessions/{id}")]
async fn close_session(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    service.close_session(id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/sessions/{id}/network")]
async fn switch_network(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
    request: web::Json<SwitchNetworkRequest>,
) -> Result<HttpResponse, CustomError> {
    let view = service.switch_network(id.into_inner(), &request.network)?;
    Ok(success_response(view))
}

#[put("/sessions/{id}/wallet")]
async fn update_wallet(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
    wallet: web::Json<WalletConnection>,
) -> Result<HttpResponse, CustomError> {
    let view = service.update_wallet(id.into_inner(), &wallet)?;
    Ok(success_response(view))
}

#[put("/sessions/{id}/address")]
async fn set_address(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
    request: web::Json<ManualAddressRequest>,
) -> Result<HttpResponse, CustomError> {
    let view = service.set_manual_address(id.into_inner(), &request.address)?;
    Ok(success_response(view))
}

#[post("/sessions/{id}/search")]
async fn search(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let view = service.search(id.into_inner()).await?;
    Ok(success_response(view))
}

#[post("/sessions/{id}/copy")]
async fn copy_address(
    service: web::Data<SessionService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    Ok(success_response(service.copy_address(id.into_inner())?))
}

//! HTTP handler functions for the parcel map API.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use parcel_map_parcel::ResolveError;
use parcel_map_parcel::assemble::to_feature_collection;
use parcel_map_server_models::{ApiError, ApiHealth, ApiParcelResponse};

use crate::AppState;

/// Header carrying the authenticated caller's user ID.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/properties/{id}/parcel`
///
/// Resolves a saved property to parcel (and zoning) polygons. Only the
/// property's owner may ask; anyone else gets the same 404 as for an
/// unknown ID.
pub async fn property_parcel(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let Some(user_id) = caller_id(&req) else {
        return HttpResponse::Unauthorized().json(ApiError::new(
            "Authentication required",
            format!("Send the {USER_ID_HEADER} header with your user ID."),
        ));
    };

    let property_id = path.into_inner();
    let Some(property) = state.properties.find_owned(&property_id, user_id).await else {
        log::debug!("Property {property_id} not found for user {user_id}");
        return HttpResponse::NotFound().json(ApiError::new(
            "Property not found",
            "No saved property with this ID belongs to you.",
        ));
    };

    let resolution = match state.resolver.resolve(&property.locator_input()).await {
        Ok(resolution) => resolution,
        Err(e) => return error_response(&e),
    };

    match to_feature_collection(&resolution) {
        Ok(geojson) => HttpResponse::Ok().json(ApiParcelResponse::new(geojson, resolution.metadata)),
        Err(e) => {
            log::error!("Failed to assemble GeoJSON for property {property_id}: {e}");
            error_response(&ResolveError::from(e))
        }
    }
}

fn caller_id(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Renders a resolution failure with its status and user-facing hint.
/// Upstream details stay in the logs.
fn error_response(e: &ResolveError) -> HttpResponse {
    if matches!(e, ResolveError::Unexpected { .. }) {
        log::error!("Parcel resolution failed: {e}");
    }
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ApiError::new(e.summary(), e.details()))
}

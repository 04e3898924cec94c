use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use marriage_common::{RequestScope, TenantId, MAJOR_VERSION_HEADER, MINOR_VERSION_HEADER, REGION_HEADER, TENANT_HEADER};

/// Extracts the tenant context from request headers, the REST layer's counterpart to
/// the command consumer's `TENANT_HEADER` parsing. `REGION`, `MAJOR_VERSION`, and
/// `MINOR_VERSION` are accepted for forward-compatibility but not threaded any further, since
/// only the tenant id currently scopes a `RequestScope`.
pub struct TenantScope(pub RequestScope);

pub struct MissingTenant;

impl IntoResponse for MissingTenant {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "errorCode": "MISSING_TENANT", "error": "missing or invalid TENANT_ID header" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = MissingTenant;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<TenantId>().ok())
            .ok_or(MissingTenant)?;

        // Accepted but not yet consumed anywhere downstream; present so a future release can
        // thread them into RequestScope without another header-parsing pass.
        let _region = header_str(parts, REGION_HEADER);
        let _major_version = header_str(parts, MAJOR_VERSION_HEADER);
        let _minor_version = header_str(parts, MINOR_VERSION_HEADER);

        Ok(Self(RequestScope::new(tenant_id)))
    }
}

fn header_str(parts: &Parts, name: &str) -> Option<String> {
    parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

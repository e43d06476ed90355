//! Identity echo endpoint.

use axum::extract::Json;

use crate::middleware::identity::Caller;
use crate::types::WhoamiResponse;

/// Returns the identity the rate gate resolved for this request.
pub async fn whoami(Caller(identity): Caller) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        identity: identity.map(|i| i.as_str().to_owned()),
    })
}

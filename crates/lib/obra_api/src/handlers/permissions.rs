//! Permission introspection for UI guards.

use axum::{Extension, Json};
use obra_core::auth::permissions::permissions_for;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{PermissionGrant, PermissionsResponse};

/// `GET /api/auth/permissions`: the caller's role and its grants.
pub async fn my_permissions_handler(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<PermissionsResponse> {
    let permissions = permissions_for(&user.role)
        .into_iter()
        .map(|(resource, action)| PermissionGrant { resource, action })
        .collect();
    Json(PermissionsResponse {
        role: user.role,
        permissions,
    })
}

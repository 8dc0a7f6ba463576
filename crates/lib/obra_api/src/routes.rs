//! Route paths.

pub const GET_API_HEALTH: &str = "/api/health";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const GET_AUTH_ME: &str = "/api/auth/me";
pub const POST_AUTH_REFRESH: &str = "/api/auth/refresh";
pub const POST_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const GET_AUTH_PERMISSIONS: &str = "/api/auth/permissions";
pub const POST_USERS_ID_PASSWORD: &str = "/api/users/{id}/password";

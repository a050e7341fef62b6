//! Storage key constants.

/// Storage keys used by the console
pub struct StorageKeys;

impl StorageKeys {
    /// Access token (JWT)
    pub const ACCESS_TOKEN: &'static str = "jwt";

    /// Refresh handle issued alongside the access token
    pub const REFRESH_TOKEN_ID: &'static str = "refreshTokenId";

    /// Raw login response (JSON)
    pub const LOGIN_INFO: &'static str = "loginInfo";

    /// Email of the signed-in operator
    pub const USER_EMAIL: &'static str = "userEmail";
}

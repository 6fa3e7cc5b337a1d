//! OpenAPI specification for the MedStock Web Server

use axum::response::Json;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::error::ErrorResponse;
use crate::handlers::{
    HealthResponse, LoginRequest, LoginResponse, MeResponse, SessionUser, SuccessResponse,
};
use medstock_ledger::{
    Direction, Item, ItemView, LedgerEntry, MovementOutcome, MovementRequest, NewItem, NewUser,
    Role, UserInfo,
};

/// Main OpenAPI specification for the MedStock Web Server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MedStock API",
        version = "0.1.0",
        description = "Medical supply inventory ledger with session authorization",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Health endpoints
        crate::handlers::health_check,

        // Sessions
        crate::handlers::login,
        crate::handlers::me,
        crate::handlers::logout,

        // User administration
        crate::handlers::list_users,
        crate::handlers::create_user,

        // Catalog
        crate::handlers::list_items,
        crate::handlers::low_stock_items,
        crate::handlers::get_item,
        crate::handlers::create_item,

        // Ledger
        crate::handlers::list_transactions,
        crate::handlers::create_transaction,
    ),
    components(
        schemas(
            HealthResponse,
            SuccessResponse,
            ErrorResponse,
            LoginRequest,
            LoginResponse,
            MeResponse,
            SessionUser,
            Role,
            NewUser,
            UserInfo,
            Item,
            ItemView,
            NewItem,
            Direction,
            LedgerEntry,
            MovementRequest,
            MovementOutcome,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Login, logout and session status"),
        (name = "Users", description = "Account administration (admin only)"),
        (name = "Items", description = "Catalog and stock levels"),
        (name = "Transactions", description = "Stock movements and the audit ledger"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme for the session cookie
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session_id"))),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Get the OpenAPI specification as pretty JSON
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "MedStock API");
        assert_eq!(openapi.info.version, "0.1.0");
        assert!(openapi.paths.paths.contains_key("/api/transactions"));
        assert!(openapi.paths.paths.contains_key("/api/items/{id}"));
    }

    #[test]
    fn test_openapi_json() {
        let json = get_openapi_json().unwrap();
        assert!(json.contains("MedStock API"));
        assert!(json.contains("session_cookie"));
    }
}

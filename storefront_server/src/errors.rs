use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use storefront_engine::{AuthApiError, CartApiError, CatalogApiError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request query: {0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not create access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
}

impl ServerError {
    /// A short, stable summary of the error kind. The full message goes in the `details` field of the response.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::InvalidRequestBody(_) | Self::InvalidQuery(_) => "Invalid request",
            Self::ValidationError(_) => "Validation failed",
            Self::AuthenticationError(AuthError::InsufficientPermissions(_)) | Self::InsufficientPermissions(_) => {
                "Forbidden"
            },
            Self::AuthenticationError(AuthError::InvalidCredentials) => "Invalid credentials",
            Self::AuthenticationError(_) => "Unauthorized",
            Self::NoRecordFound(_) => "Not found",
            Self::Conflict(_) => "Conflict",
            Self::CouldNotSerializeAccessToken(_) => "Could not issue access token",
            Self::InitializeError(_) |
            Self::BackendError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) => "Internal server error",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Backend details are logged, not returned to the client
        let details = if self.status_code().is_server_error() {
            error!("💻️ {self}");
            "The server could not complete the request".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.summary(), "details": details }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided. Please log in first.")]
    MissingToken,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::EmailAlreadyRegistered(_) => Self::Conflict(e.to_string()),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::InvalidRegistration(_) => Self::ValidationError(e.to_string()),
            AuthApiError::PasswordHashError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::DuplicateSku(_) | CatalogApiError::ProductInUse(_) => Self::Conflict(e.to_string()),
            CatalogApiError::InvalidProduct(_) | CatalogApiError::UpdateNoOp => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CartApiError::ProductNotFound(_) | CartApiError::CartItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::InsufficientStock { .. } |
            CartApiError::InvalidQuantity(_) |
            CartApiError::TotalOverflow => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            // Orders that belong to someone else are indistinguishable from orders that do not exist
            OrderFlowError::OrderNotFound(id) | OrderFlowError::NotOrderOwner(id) => {
                Self::NoRecordFound(format!("The order {id} does not exist"))
            },
            OrderFlowError::CartChanged => Self::Conflict(e.to_string()),
            OrderFlowError::EmptyCart |
            OrderFlowError::TotalOverflow |
            OrderFlowError::InsufficientStock { .. } |
            OrderFlowError::MixedCurrencies(_) |
            OrderFlowError::InvalidStatus(_) |
            OrderFlowError::OrderAlreadyPaid(_) |
            OrderFlowError::InvalidShippingAddress(_) => Self::ValidationError(e.to_string()),
        }
    }
}

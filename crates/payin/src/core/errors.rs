use serde::Serialize;

pub type CustomResult<T, E> = error_stack::Result<T, E>;
pub type PayinResult<T> = CustomResult<T, ApiErrorResponse>;

/// Client-facing error taxonomy. Every variant carries a stable error code,
/// a message, and whether the client may retry the exact same request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiErrorResponse {
    #[error("Cart payment not found")]
    CartPaymentNotFound,
    #[error("Requested cart payment amount is invalid")]
    CartPaymentAmountInvalid,
    #[error("Cart payment was concurrently modified, please retry")]
    CartPaymentUpdateConflict,
    #[error("Payment method not found")]
    PaymentMethodNotFound,
    #[error("Payment method does not belong to the provided payer")]
    PaymentMethodPayerMismatch,
    #[error("Payment provider error: {message}")]
    ProviderError {
        code: String,
        message: String,
        retryable: bool,
    },
    #[error("Payment provider could not be reached")]
    ProviderUnavailable,
    #[error("Internal Server Error")]
    InternalServerError,
}

impl ApiErrorResponse {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CartPaymentNotFound => "cart_payment_not_found",
            Self::CartPaymentAmountInvalid => "cart_payment_amount_invalid",
            Self::CartPaymentUpdateConflict => "cart_payment_update_conflict",
            Self::PaymentMethodNotFound => "payment_method_not_found",
            Self::PaymentMethodPayerMismatch => "payment_method_payer_mismatch",
            Self::ProviderError { .. } => "provider_error",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::InternalServerError => "internal_server_error",
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::CartPaymentNotFound
            | Self::CartPaymentAmountInvalid
            | Self::PaymentMethodNotFound
            | Self::PaymentMethodPayerMismatch
            | Self::InternalServerError => false,
            Self::CartPaymentUpdateConflict | Self::ProviderUnavailable => true,
            Self::ProviderError { retryable, .. } => *retryable,
        }
    }

    /// Status the (external) transport layer maps this error to.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::CartPaymentNotFound => 404,
            Self::CartPaymentAmountInvalid
            | Self::PaymentMethodNotFound
            | Self::PaymentMethodPayerMismatch => 422,
            Self::CartPaymentUpdateConflict => 409,
            Self::ProviderError { .. } => 502,
            Self::ProviderUnavailable => 503,
            Self::InternalServerError => 500,
        }
    }

    pub fn to_response_body(&self) -> PaymentErrorResponseBody {
        PaymentErrorResponseBody {
            error_code: self.error_code().to_owned(),
            error_message: self.to_string(),
            retryable: self.retryable(),
        }
    }
}

/// Wire shape of an error, rendered by the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentErrorResponseBody {
    pub error_code: String,
    pub error_message: String,
    pub retryable: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("DatabaseError: {0:?}")]
    DatabaseError(error_stack::Report<storage_models::errors::DatabaseError>),
    #[error("An error occurred when obtaining database connection")]
    DatabaseConnectionError,
    #[error("The requested resource was not found: {0}")]
    ValueNotFound(String),
    #[error("{entity} already exists for key {key:?}")]
    DuplicateValue {
        entity: &'static str,
        key: Option<String>,
    },
    #[error("An operation was attempted against the mock database that it does not support")]
    MockDbError,
}

impl StorageError {
    pub fn is_db_not_found(&self) -> bool {
        match self {
            Self::DatabaseError(report) => matches!(
                report.current_context(),
                storage_models::errors::DatabaseError::NotFound
            ),
            Self::ValueNotFound(_) => true,
            _ => false,
        }
    }

    pub fn is_db_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseError(report) => matches!(
                report.current_context(),
                storage_models::errors::DatabaseError::UniqueViolation
            ),
            Self::DuplicateValue { .. } => true,
            _ => false,
        }
    }
}

impl From<error_stack::Report<storage_models::errors::DatabaseError>> for StorageError {
    fn from(report: error_stack::Report<storage_models::errors::DatabaseError>) -> Self {
        Self::DatabaseError(report)
    }
}

/// Errors surfaced by the provider gateway before they are mapped onto the
/// client-facing taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Provider returned an error: [{code}] {message}")]
    ProviderError {
        code: String,
        message: String,
        retryable: bool,
    },
    #[error("Provider call timed out, outcome unknown")]
    Timeout,
    #[error("Failed to establish a connection to the provider")]
    ConnectionError,
    #[error("Failed to process the provider response")]
    ResponseDeserializationFailed,
    #[error("Failed to build the provider request")]
    RequestEncodingFailed,
}

pub trait StorageErrorExt<T, E> {
    #[track_caller]
    fn to_not_found_response(self, not_found_response: E) -> error_stack::Result<T, E>;

    #[track_caller]
    fn to_duplicate_response(self, duplicate_response: E) -> error_stack::Result<T, E>;
}

impl<T> StorageErrorExt<T, ApiErrorResponse> for error_stack::Result<T, StorageError> {
    fn to_not_found_response(
        self,
        not_found_response: ApiErrorResponse,
    ) -> error_stack::Result<T, ApiErrorResponse> {
        self.map_err(|err| {
            if err.current_context().is_db_not_found() {
                err.change_context(not_found_response)
            } else {
                err.change_context(ApiErrorResponse::InternalServerError)
            }
        })
    }

    fn to_duplicate_response(
        self,
        duplicate_response: ApiErrorResponse,
    ) -> error_stack::Result<T, ApiErrorResponse> {
        self.map_err(|err| {
            if err.current_context().is_db_unique_violation() {
                err.change_context(duplicate_response)
            } else {
                err.change_context(ApiErrorResponse::InternalServerError)
            }
        })
    }
}

pub trait GatewayErrorExt<T> {
    /// Fold a gateway failure into the client-facing taxonomy, preserving
    /// the provider's own retry guidance.
    fn to_provider_response(self) -> PayinResult<T>;
}

impl<T> GatewayErrorExt<T> for CustomResult<T, GatewayError> {
    fn to_provider_response(self) -> PayinResult<T> {
        self.map_err(|err| {
            let api_error = match err.current_context() {
                GatewayError::ProviderError {
                    code,
                    message,
                    retryable,
                } => ApiErrorResponse::ProviderError {
                    code: code.clone(),
                    message: message.clone(),
                    retryable: *retryable,
                },
                GatewayError::Timeout | GatewayError::ConnectionError => {
                    ApiErrorResponse::ProviderUnavailable
                }
                GatewayError::ResponseDeserializationFailed
                | GatewayError::RequestEncodingFailed => ApiErrorResponse::InternalServerError,
            };
            err.change_context(api_error)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_codes_and_retryability() {
        assert_eq!(
            ApiErrorResponse::CartPaymentNotFound.error_code(),
            "cart_payment_not_found"
        );
        assert!(!ApiErrorResponse::CartPaymentNotFound.retryable());
        assert!(ApiErrorResponse::CartPaymentUpdateConflict.retryable());
        assert!(ApiErrorResponse::ProviderUnavailable.retryable());
        assert!(!ApiErrorResponse::PaymentMethodPayerMismatch.retryable());
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(ApiErrorResponse::CartPaymentNotFound.http_status_code(), 404);
        assert_eq!(
            ApiErrorResponse::CartPaymentAmountInvalid.http_status_code(),
            422
        );
        assert_eq!(ApiErrorResponse::ProviderUnavailable.http_status_code(), 503);
        assert_eq!(ApiErrorResponse::InternalServerError.http_status_code(), 500);
    }

    #[test]
    fn response_body_shape() {
        let body = ApiErrorResponse::ProviderError {
            code: "card_declined".to_string(),
            message: "Your card was declined".to_string(),
            retryable: false,
        }
        .to_response_body();
        assert_eq!(body.error_code, "provider_error");
        assert!(!body.retryable);
    }
}

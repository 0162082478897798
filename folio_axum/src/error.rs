use folio::CoordinationError;
use http::{Result as HttpResponse, StatusCode};

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

/// Status code a coordination failure is reported with
pub(crate) fn status_of(error: &CoordinationError) -> StatusCode {
    match error {
        CoordinationError::RegistrationClosed => StatusCode::FORBIDDEN,
        CoordinationError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        CoordinationError::PortfolioError(_) => StatusCode::BAD_REQUEST,
        CoordinationError::SessionError(_) => StatusCode::BAD_REQUEST,
        // The backend rejected the credentials or the input
        CoordinationError::BackendError(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (status_of(&e), e.to_string()))
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for HttpResponse<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}

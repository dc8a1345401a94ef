use http::StatusCode;
use rent_auth::{CallbackError, SessionError};

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

fn session_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::Unauthorized | SessionError::Refresh(_) => StatusCode::UNAUTHORIZED,
        SessionError::Provider(_) | SessionError::Exchange(_) => StatusCode::BAD_REQUEST,
        SessionError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T> IntoResponseError<T> for Result<T, CallbackError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match &e {
                CallbackError::ProviderReported(_) | CallbackError::MissingVerifier => {
                    StatusCode::BAD_REQUEST
                }
                CallbackError::Session(err) => session_status(err),
                CallbackError::Pkce(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rent_auth::PkceError;

    fn status_of<E>(result: Result<(), E>) -> StatusCode
    where
        Result<(), E>: IntoResponseError<()>,
    {
        match result.into_response_error() {
            Err((status, _)) => status,
            Ok(()) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_callback_error_statuses() {
        assert_eq!(
            status_of(Err::<(), _>(CallbackError::MissingVerifier)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Err::<(), _>(CallbackError::from(SessionError::Provider(
                "unsupported provider: myspace".into()
            )))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Err::<(), _>(CallbackError::from(SessionError::Transport(
                "connection refused".into()
            )))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(Err::<(), _>(CallbackError::from(PkceError::Storage(
                "quota".into()
            )))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejected_session_is_unauthorized() {
        assert_eq!(
            status_of(Err::<(), _>(CallbackError::from(SessionError::Refresh(
                "invalid refresh token".into()
            )))),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_success_case() {
        let result: Result<String, CallbackError> = Ok("Success".to_string());
        assert_eq!(result.into_response_error().ok(), Some("Success".to_string()));
    }
}

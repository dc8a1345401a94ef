//! Role provisioning endpoint backing the select-role page.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use http::HeaderMap;

use rent_auth::{
    LookupError, SelectUserTypeRequest, SelectUserTypeResponse, SessionError,
    resolve_request_session, secure_cookies,
};

use super::state::AuthContext;

pub(super) fn router() -> Router<AuthContext> {
    Router::new().route("/select-user-type", post(select_user_type))
}

/// Provisions the caller's application user with the chosen role.
///
/// The caller is identified by a bearer access token when one is sent,
/// otherwise by the session cookies.
pub(super) async fn select_user_type(
    State(ctx): State<AuthContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    headers: HeaderMap,
    Json(request): Json<SelectUserTypeRequest>,
) -> Response {
    let (subject_id, cookies) = match caller(&ctx, bearer, &headers).await {
        Ok(Some(caller)) => caller,
        Ok(None) => {
            return reply(
                StatusCode::UNAUTHORIZED,
                HeaderMap::new(),
                SelectUserTypeResponse::failed("Not signed in"),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not identify caller");
            return reply(
                StatusCode::BAD_GATEWAY,
                HeaderMap::new(),
                SelectUserTypeResponse::failed("Identity provider unavailable"),
            );
        }
    };

    match ctx.users.provision(&subject_id, request.user_type).await {
        Ok(user) => {
            tracing::info!(subject = %subject_id, role = %user.role, "User type selected");
            reply(StatusCode::OK, cookies, SelectUserTypeResponse::ok())
        }
        Err(LookupError::RoleConflict { existing }) => {
            tracing::warn!(subject = %subject_id, %existing, requested = %request.user_type, "Role already chosen");
            reply(
                StatusCode::CONFLICT,
                cookies,
                SelectUserTypeResponse::failed(format!("Already registered as {existing}")),
            )
        }
        Err(e) => {
            tracing::error!(subject = %subject_id, error = %e, "Provisioning failed");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                cookies,
                SelectUserTypeResponse::failed("Could not save user type"),
            )
        }
    }
}

/// Subject of the caller plus any session cookie rewrites, or `None` when
/// the request carries no valid credentials.
async fn caller(
    ctx: &AuthContext,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    headers: &HeaderMap,
) -> Result<Option<(String, HeaderMap)>, SessionError> {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        return match ctx.provider.get_user(bearer.token()).await {
            Ok(user) => Ok(Some((user.id, HeaderMap::new()))),
            Err(SessionError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        };
    }

    let resolved = resolve_request_session(ctx.provider.as_ref(), headers, secure_cookies(headers))
        .await?;
    Ok(resolved
        .session
        .map(|session| (session.user.id, resolved.cookies)))
}

fn reply(status: StatusCode, cookies: HeaderMap, body: SelectUserTypeResponse) -> Response {
    (status, cookies, Json(body)).into_response()
}

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};
use http::HeaderMap;

use rent_auth::{
    AUTH_SIGNIN_PATH, CallbackError, CallbackParams, Destination, OAuthProvider,
    ServerCallbackOptions, begin_server_sign_in, handle_server_callback, secure_cookies,
    sign_out_request,
};

use super::error::IntoResponseError;
use super::state::AuthContext;

pub(super) fn router() -> Router<AuthContext> {
    Router::new()
        .route("/signin/{provider}", get(signin))
        .route("/callback", get(callback))
        .route("/signout", post(signout))
        .route("/select-role", post(super::role::select_user_type))
}

async fn signin(
    State(ctx): State<AuthContext>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> (HeaderMap, Redirect) {
    let started = match provider.parse::<OAuthProvider>() {
        Ok(provider) => {
            begin_server_sign_in(ctx.provider.as_ref(), provider, secure_cookies(&headers)).await
        }
        Err(e) => Err(CallbackError::from(e)),
    };

    match started {
        Ok(sign_in) => (sign_in.headers, Redirect::to(sign_in.authorize_url.as_str())),
        Err(e) => {
            let destination = Destination::sign_in_error(e.log().tag());
            (HeaderMap::new(), Redirect::to(&destination.path()))
        }
    }
}

async fn callback(
    State(ctx): State<AuthContext>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (HeaderMap, Redirect) {
    let params = CallbackParams::from_query(query.as_deref().unwrap_or_default());
    let response = handle_server_callback(
        &params,
        ctx.provider.as_ref(),
        ctx.users.as_ref(),
        &headers,
        ServerCallbackOptions::from_env(secure_cookies(&headers)),
    )
    .await;

    tracing::debug!(destination = ?response.destination, "Callback handled");
    (response.headers, Redirect::to(&response.destination.path()))
}

async fn signout(
    State(ctx): State<AuthContext>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Redirect), (StatusCode, String)> {
    let cookies = sign_out_request(ctx.provider.as_ref(), &headers, secure_cookies(&headers))
        .await
        .into_response_error()?;
    Ok((cookies, Redirect::to(AUTH_SIGNIN_PATH.as_str())))
}

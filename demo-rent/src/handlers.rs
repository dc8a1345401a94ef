use askama::Template;
use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use rent_auth::{AUTH_ROUTE_PREFIX, AuthState, Destination, Role};
use rent_auth_axum::{AuthSession, CurrentAuthState, RequireOwner, RequireTenant};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.j2")]
struct LoginTemplate<'a> {
    notice: Option<&'a str>,
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "select_role.j2")]
struct SelectRoleTemplate<'a> {
    name: String,
    owner_home: String,
    tenant_home: String,
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "dashboard.j2")]
struct DashboardTemplate<'a> {
    title: &'a str,
    name: String,
    auth_route_prefix: &'a str,
}

fn render(template: impl Template) -> Result<Html<String>, (StatusCode, String)> {
    template
        .render()
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn display_name(auth: &AuthSession) -> String {
    auth.session
        .user
        .display_name()
        .unwrap_or_else(|| auth.subject_id().to_string())
}

fn notice(tag: &str) -> &'static str {
    match tag {
        "no_code_verifier" => "Your sign-in expired before it finished. Please start again.",
        _ => "Sign-in failed. Please try again.",
    }
}

pub(crate) async fn login(Query(query): Query<LoginQuery>) -> Result<Html<String>, (StatusCode, String)> {
    render(LoginTemplate {
        notice: query.error.as_deref().map(notice),
        auth_route_prefix: AUTH_ROUTE_PREFIX.as_str(),
    })
}

pub(crate) async fn select_role(
    CurrentAuthState(state): CurrentAuthState,
    auth: Option<AuthSession>,
) -> Result<Response, (StatusCode, String)> {
    let (AuthState::Authenticating, Some(auth)) = (state, auth) else {
        return Ok(Redirect::to(&Destination::for_state(state).path()).into_response());
    };
    render(SelectRoleTemplate {
        name: display_name(&auth),
        owner_home: Destination::Home(Role::Owner).path(),
        tenant_home: Destination::Home(Role::Tenant).path(),
        auth_route_prefix: AUTH_ROUTE_PREFIX.as_str(),
    })
    .map(IntoResponse::into_response)
}

pub(crate) async fn owner_dashboard(
    owner: RequireOwner,
) -> Result<Html<String>, (StatusCode, String)> {
    render(DashboardTemplate {
        title: "Owner dashboard",
        name: display_name(&owner.auth),
        auth_route_prefix: AUTH_ROUTE_PREFIX.as_str(),
    })
}

pub(crate) async fn tenant_dashboard(
    tenant: RequireTenant,
) -> Result<Html<String>, (StatusCode, String)> {
    render(DashboardTemplate {
        title: "Tenant dashboard",
        name: display_name(&tenant.auth),
        auth_route_prefix: AUTH_ROUTE_PREFIX.as_str(),
    })
}

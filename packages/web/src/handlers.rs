//! HTTP handlers.
//!
//! Pages answer an unauthorized navigation with `303 See Other` to `/login`;
//! `/api/state` answers with a JSON 401 instead.

use api::auth::AuthContext;
use api::router::{Action, PageState};
use api::RouteError;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;

use crate::cookie;
use crate::error::AppError;
use crate::render::ViewData;
use crate::AppState;

/// The caller, resolved from the session cookie. Anonymous when the cookie is
/// missing, unknown or expired.
pub struct Viewer(pub AuthContext);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = cookie::session_token(&parts.headers);
        let ctx = state.sessions.authenticate(token.as_deref()).await?;
        Ok(Viewer(ctx))
    }
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// `name` is accepted for old links; titles come from the datastore.
#[derive(Deserialize)]
pub struct UserQuery {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct AlbumQuery {
    pub id: i64,
    #[serde(default)]
    pub owner: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    Viewer(ctx): Viewer,
) -> Result<Response, AppError> {
    if ctx.is_authenticated() {
        if let Ok(landing) = state.router.route(&ctx, &Action::Login).await {
            return Ok(Redirect::to(&landing.path()).into_response());
        }
    }
    render_login(&state, StatusCode::OK, None)
}

pub async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let (session, ctx) = match state
        .sessions
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(done) => done,
        Err(e) if e.is_credential_failure() => {
            return render_login(&state, StatusCode::UNAUTHORIZED, Some(e.public_message()));
        }
        Err(e) => return Err(e.into()),
    };

    let landing = match state.router.route(&ctx, &Action::Login).await {
        Ok(landing) => landing,
        Err(RouteError::Storage(e)) => return Err(e.into()),
        Err(RouteError::Unauthorized) => PageState::login(),
    };

    let mut headers = HeaderMap::new();
    if let Some(value) = cookie::header_value(&state.cookies.session(&session.token)) {
        headers.insert(header::SET_COOKIE, value);
    }
    Ok((headers, Redirect::to(&landing.path())).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Viewer(ctx): Viewer,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let next = match state.router.route(&ctx, &Action::Logout).await {
        Ok(next) => next,
        Err(RouteError::Storage(e)) => return Err(e.into()),
        Err(RouteError::Unauthorized) => PageState::login(),
    };

    if let Some(token) = cookie::session_token(&headers) {
        if let Some(user_id) = state.sessions.end_session(&token).await? {
            tracing::info!(user_id, "logged out");
        }
    }

    let mut response_headers = HeaderMap::new();
    if let Some(value) = cookie::header_value(&state.cookies.removal()) {
        response_headers.insert(header::SET_COOKIE, value);
    }
    Ok((response_headers, Redirect::to(&next.path())).into_response())
}

pub async fn dashboard(
    State(state): State<AppState>,
    Viewer(ctx): Viewer,
) -> Result<Response, AppError> {
    show(&state, &ctx, Action::Dashboard).await
}

pub async fn user_view(
    State(state): State<AppState>,
    Viewer(ctx): Viewer,
    Query(query): Query<UserQuery>,
) -> Result<Response, AppError> {
    tracing::debug!(owner_id = query.id, link_name = ?query.name, "albums requested");
    show(&state, &ctx, Action::Albums { owner_id: query.id }).await
}

pub async fn album_view(
    State(state): State<AppState>,
    Viewer(ctx): Viewer,
    Query(query): Query<AlbumQuery>,
) -> Result<Response, AppError> {
    let Some(owner_id) = query.owner.or_else(|| ctx.user().map(|u| u.id)) else {
        return Ok(Redirect::to("/login").into_response());
    };
    tracing::debug!(album_id = query.id, owner_id, link_name = ?query.name, "images requested");
    show(
        &state,
        &ctx,
        Action::Images {
            album_id: query.id,
            owner_id,
        },
    )
    .await
}

/// Landing page of the caller as JSON.
pub async fn state(State(state): State<AppState>, Viewer(ctx): Viewer) -> Result<Response, AppError> {
    if !ctx.is_authenticated() {
        return Ok(unauthorized_json());
    }
    match state.router.route(&ctx, &Action::Login).await {
        Ok(landing) => Ok(Json(landing).into_response()),
        Err(RouteError::Unauthorized) => Ok(unauthorized_json()),
        Err(RouteError::Storage(e)) => Err(e.into()),
    }
}

async fn show(state: &AppState, ctx: &AuthContext, action: Action) -> Result<Response, AppError> {
    let page = match state.router.route(ctx, &action).await {
        Ok(page) => page,
        Err(RouteError::Unauthorized) => return Ok(Redirect::to("/login").into_response()),
        Err(RouteError::Storage(e)) => return Err(e.into()),
    };
    let table = state.router.page_data(&page).await?;

    let data = ViewData {
        title: page.title.clone(),
        viewer: ctx.user().map(|u| u.name.clone()),
        message: None,
        table,
        state: Some(page.clone()),
    };
    let body = state.renderer.render(page.page.as_str(), &data)?;
    Ok(html(StatusCode::OK, body))
}

fn render_login(
    state: &AppState,
    status: StatusCode,
    message: Option<&str>,
) -> Result<Response, AppError> {
    let body = state.renderer.render("login", &ViewData::login(message))?;
    Ok(html(status, body))
}

fn html(status: StatusCode, body: Vec<u8>) -> Response {
    (status, Html(body)).into_response()
}

fn unauthorized_json() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "status": "unauthorized" })),
    )
        .into_response()
}

//! # Web crate — the PhotoBook HTTP front end
//!
//! Thin axum layer over the `api` crate. Each handler reads the session cookie
//! into an [`AuthContext`](api::auth::AuthContext) (see [`handlers::Viewer`]),
//! asks the [`PageRouter`] what to show and renders it. Routing decisions and
//! session rules live in `api`; nothing here decides who may see what.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/`, `/login` | [`handlers::login_page`] |
//! | POST | `/login` | [`handlers::login`] |
//! | GET | `/logout` | [`handlers::logout`] |
//! | GET | `/dashboard` | [`handlers::dashboard`] |
//! | GET | `/user/view` | [`handlers::user_view`] |
//! | GET | `/album/view` | [`handlers::album_view`] |
//! | GET | `/api/state` | [`handlers::state`] |

use std::sync::Arc;

use api::auth::{Passwords, SessionManager};
use api::db::SqlStore;
use api::router::PageRouter;
use api::settings::Settings;
use axum::routing::get;
use axum::Router;
use chrono::TimeDelta;

pub mod cookie;
pub mod error;
pub mod handlers;
pub mod render;

use cookie::CookieConfig;
use render::{HtmlRenderer, Renderer};

/// Shared by every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager<SqlStore>>,
    pub router: Arc<PageRouter<SqlStore>>,
    pub renderer: Arc<dyn Renderer>,
    pub cookies: CookieConfig,
}

impl AppState {
    pub fn new(
        sessions: SessionManager<SqlStore>,
        router: PageRouter<SqlStore>,
        cookies: CookieConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(sessions),
            router: Arc::new(router),
            renderer: Arc::new(HtmlRenderer),
            cookies,
        }
    }

    /// Wire sessions, routing and cookies from settings over one datastore.
    pub fn from_settings(
        store: SqlStore,
        passwords: Passwords,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let ttl = TimeDelta::seconds(i64::from(settings.session.ttl_secs));
        let sessions = SessionManager::new(store.clone(), passwords, ttl)?;
        let router = PageRouter::new(store)?;
        let cookies = CookieConfig {
            secure: settings.session.secure_cookie,
            max_age_secs: ttl.num_seconds(),
        };
        Ok(Self::new(sessions, router, cookies))
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::login_page))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route("/user/view", get(handlers::user_view))
        .route("/album/view", get(handlers::album_view))
        .route("/api/state", get(handlers::state))
        .with_state(state)
}

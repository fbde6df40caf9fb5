//! # Page router — which page a request gets to see
//!
//! [`PageRouter::route`] maps an [`AuthContext`] and a requested [`Action`] to a
//! [`PageState`]. It works in two steps:
//!
//! 1. **Role gate.** The caller's home page (login when anonymous, dashboard for
//!    admins, albums for regular users) and the input `"<role>:<action>"` are
//!    fed to the transition table in `routes.toml`, compiled once by
//!    [`fsm::StateMachine`]. Whatever a role has no rule for falls back to the
//!    login page, which for anything but `Login`/`Logout` means
//!    [`RouteError::Unauthorized`].
//! 2. **Scope check.** Albums and images are only shown for an owner the caller
//!    may see (admins: anyone, regular users: themselves). For images the album
//!    is re-read and must belong to that owner; ids from the query string are
//!    never trusted on their own.
//!
//! [`PageState::data_request`] then says what the page needs from the
//! datastore and [`PageRouter::page_data`] fetches it.

use std::str::FromStr;

use fsm::StateMachine;
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::db::Datastore;
use crate::error::{RouteError, StorageError};
use crate::models::{Role, Table, User};

const ROUTES: &str = include_str!("routes.toml");

/// Title of the admin landing page.
pub const DASHBOARD_TITLE: &str = "Administrator";
/// Title of the login page.
pub const APP_TITLE: &str = "PhotoBook";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Login,
    Dashboard,
    Albums,
    Images,
}

impl Page {
    pub fn as_str(self) -> &'static str {
        match self {
            Page::Login => "login",
            Page::Dashboard => "dashboard",
            Page::Albums => "albums",
            Page::Images => "images",
        }
    }

    /// Where a role starts its navigation.
    pub fn home(role: Role) -> Self {
        match role {
            Role::Admin => Page::Dashboard,
            Role::Regular => Page::Albums,
        }
    }
}

impl FromStr for Page {
    type Err = RouteTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Page::Login),
            "dashboard" => Ok(Page::Dashboard),
            "albums" => Ok(Page::Albums),
            "images" => Ok(Page::Images),
            other => Err(RouteTableError::UnknownPage(other.to_string())),
        }
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Dashboard,
    Albums { owner_id: i64 },
    Images { album_id: i64, owner_id: i64 },
    Logout,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Dashboard => "dashboard",
            Action::Albums { .. } => "albums",
            Action::Images { .. } => "images",
            Action::Logout => "logout",
        }
    }
}

/// Data a page needs before it can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRequest {
    None,
    RegularUsers,
    Albums { owner_id: i64 },
    Images { album_id: i64, owner_id: i64 },
}

/// The resolved "what to render next".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub page: Page,
    /// Owner whose albums/images are in view.
    pub scope_owner_id: Option<i64>,
    pub album_id: Option<i64>,
    pub title: String,
}

impl PageState {
    pub fn login() -> Self {
        Self {
            page: Page::Login,
            scope_owner_id: None,
            album_id: None,
            title: APP_TITLE.to_string(),
        }
    }

    fn dashboard() -> Self {
        Self {
            page: Page::Dashboard,
            scope_owner_id: None,
            album_id: None,
            title: DASHBOARD_TITLE.to_string(),
        }
    }

    pub fn data_request(&self) -> DataRequest {
        match (self.page, self.scope_owner_id, self.album_id) {
            (Page::Dashboard, _, _) => DataRequest::RegularUsers,
            (Page::Albums, Some(owner_id), _) => DataRequest::Albums { owner_id },
            (Page::Images, Some(owner_id), Some(album_id)) => {
                DataRequest::Images { album_id, owner_id }
            }
            _ => DataRequest::None,
        }
    }

    /// Canonical URL of this page.
    pub fn path(&self) -> String {
        match (self.page, self.scope_owner_id, self.album_id) {
            (Page::Dashboard, _, _) => "/dashboard".to_string(),
            (Page::Albums, Some(owner), _) => format!("/user/view?id={owner}"),
            (Page::Images, Some(owner), Some(album)) => {
                format!("/album/view?id={album}&owner={owner}")
            }
            _ => "/login".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteTableError {
    #[error(transparent)]
    Build(#[from] fsm::BuildError),
    #[error("transition table names unknown page `{0}`")]
    UnknownPage(String),
}

pub struct PageRouter<S> {
    store: S,
    table: StateMachine,
}

impl<S> std::fmt::Debug for PageRouter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRouter")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<S: Datastore> PageRouter<S> {
    /// Router over the built-in transition table.
    pub fn new(store: S) -> Result<Self, RouteTableError> {
        Self::with_table(store, StateMachine::from_toml(ROUTES)?)
    }

    /// Router over a custom table. Every state in it must name a [`Page`].
    pub fn with_table(store: S, table: StateMachine) -> Result<Self, RouteTableError> {
        for state in table.states() {
            state.parse::<Page>()?;
        }
        Ok(Self { store, table })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn route(&self, ctx: &AuthContext, action: &Action) -> Result<PageState, RouteError> {
        let next = self.next_page(ctx, action);

        let user = match (next, ctx.user()) {
            (Page::Login, _) => {
                return match action {
                    Action::Login | Action::Logout => Ok(PageState::login()),
                    _ => {
                        tracing::warn!(
                            action = action.name(),
                            role = ctx.role().map(Role::as_str),
                            "navigation refused"
                        );
                        Err(RouteError::Unauthorized)
                    }
                };
            }
            (_, Some(user)) => user,
            (_, None) => return Err(RouteError::Unauthorized),
        };

        match (next, action) {
            (Page::Dashboard, _) => Ok(PageState::dashboard()),
            (Page::Albums, Action::Albums { owner_id }) => self.albums(user, *owner_id).await,
            (Page::Albums, _) => self.albums(user, user.id).await,
            (Page::Images, Action::Images { album_id, owner_id }) => {
                self.images(user, *album_id, *owner_id).await
            }
            (Page::Images, _) | (Page::Login, _) => Err(RouteError::Unauthorized),
        }
    }

    /// Fetch the table a resolved page displays.
    pub async fn page_data(&self, state: &PageState) -> Result<Table, StorageError> {
        Ok(match state.data_request() {
            DataRequest::None => Table::default(),
            DataRequest::RegularUsers => Table::users(&self.store.regular_users().await?),
            DataRequest::Albums { owner_id } => Table::albums(&self.store.albums_for(owner_id).await?),
            DataRequest::Images { album_id, owner_id } => {
                Table::images(&self.store.images_in(album_id, owner_id).await?)
            }
        })
    }

    fn next_page(&self, ctx: &AuthContext, action: &Action) -> Page {
        let (from, role) = match ctx.role() {
            Some(role) => (Page::home(role), role.as_str()),
            None => (Page::Login, "anonymous"),
        };
        let input = format!("{role}:{}", action.name());
        self.table
            .step(from.as_str(), &input)
            .parse()
            .unwrap_or(Page::Login)
    }

    async fn albums(&self, user: &User, owner_id: i64) -> Result<PageState, RouteError> {
        let owner = self.owner_in_scope(user, owner_id).await?;
        Ok(PageState {
            page: Page::Albums,
            scope_owner_id: Some(owner.id),
            album_id: None,
            title: owner.name,
        })
    }

    async fn images(
        &self,
        user: &User,
        album_id: i64,
        owner_id: i64,
    ) -> Result<PageState, RouteError> {
        let owner = self.owner_in_scope(user, owner_id).await?;
        match self.store.album_by_id(album_id).await? {
            Some(album) if album.owner_id == owner.id => Ok(PageState {
                page: Page::Images,
                scope_owner_id: Some(owner.id),
                album_id: Some(album.id),
                title: album.name,
            }),
            _ => {
                tracing::warn!(user_id = user.id, album_id, owner_id, "album outside scope");
                Err(RouteError::Unauthorized)
            }
        }
    }

    /// Admins may look at anyone, regular users only at themselves.
    async fn owner_in_scope(&self, user: &User, owner_id: i64) -> Result<User, RouteError> {
        if owner_id == user.id {
            return Ok(user.clone());
        }
        if !user.is_admin() {
            tracing::warn!(user_id = user.id, owner_id, "owner outside scope");
            return Err(RouteError::Unauthorized);
        }
        self.store
            .user_by_id(owner_id)
            .await?
            .ok_or(RouteError::Unauthorized)
    }
}

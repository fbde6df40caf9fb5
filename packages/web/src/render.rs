//! # Page rendering
//!
//! Handlers never build markup. They fill a [`ViewData`] and hand it, with a
//! view name, to a [`Renderer`]. [`HtmlRenderer`] is the shipped
//! implementation, written with [Maud](https://maud.lambda.xyz/): every value
//! spliced into the page is HTML-escaped by the `html!` macro.
//!
//! | View | Shows |
//! |------|-------|
//! | `login` | the credentials form and an optional message |
//! | `dashboard` | regular users, each linking to their albums |
//! | `albums` | the albums of one user, each linking to its images |
//! | `images` | the images of one album |
//! | `error` | a generic failure message |

use api::models::Table;
use api::router::{Page, PageState};
use maud::{html, Markup, DOCTYPE};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown view `{0}`")]
    UnknownView(String),
}

/// Everything a view may show.
#[derive(Debug, Clone, Default)]
pub struct ViewData {
    pub title: String,
    /// Display name of the logged-in user.
    pub viewer: Option<String>,
    pub message: Option<String>,
    pub state: Option<PageState>,
    pub table: Table,
}

impl ViewData {
    pub fn login(message: Option<&str>) -> Self {
        Self {
            title: PageState::login().title,
            message: message.map(String::from),
            ..Self::default()
        }
    }

    pub fn error() -> Self {
        Self {
            title: "Error".into(),
            message: Some("Something went wrong. Please try again later.".into()),
            ..Self::default()
        }
    }
}

pub trait Renderer: Send + Sync {
    fn render(&self, view: &str, data: &ViewData) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, view: &str, data: &ViewData) -> Result<Vec<u8>, RenderError> {
        let content = match view {
            "login" => login_form(),
            "dashboard" | "albums" | "images" => table(data),
            "error" => html! {},
            other => return Err(RenderError::UnknownView(other.to_string())),
        };
        Ok(page(data, content).into_string().into_bytes())
    }
}

fn page(data: &ViewData, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "PhotoBook - " (data.title) }
            }
            body {
                @if let Some(viewer) = &data.viewer {
                    header { (viewer) " " a href="/logout" { "Log out" } }
                }
                h1 { (data.title) }
                @if let Some(message) = &data.message {
                    p.message { (message) }
                }
                (content)
            }
        }
    }
}

fn login_form() -> Markup {
    html! {
        form method="post" action="/login" {
            label { "Username " input name="username" autocomplete="username"; }
            label { "Password " input name="password" type="password" autocomplete="current-password"; }
            button type="submit" { "Log in" }
        }
    }
}

fn table(data: &ViewData) -> Markup {
    if data.table.is_empty() {
        return html! { p { "Nothing here yet." } };
    }
    html! {
        table {
            tr {
                @for column in &data.table.header {
                    th { (column) }
                }
            }
            @for row in &data.table.rows {
                @let href = data.state.as_ref().and_then(|state| row_link(state, row.id));
                tr {
                    @for (i, cell) in row.cells.iter().enumerate() {
                        td {
                            @match (&href, i) {
                                (Some(href), 0) => { a href=(href) { (cell) } }
                                _ => { (cell) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Where a row of the given page leads.
fn row_link(state: &PageState, id: i64) -> Option<String> {
    match (state.page, state.scope_owner_id) {
        (Page::Dashboard, _) => Some(format!("/user/view?id={id}")),
        (Page::Albums, Some(owner)) => Some(format!("/album/view?id={id}&owner={owner}")),
        _ => None,
    }
}

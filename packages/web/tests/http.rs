use api::auth::{HashParams, Passwords, SessionManager};
use api::db::SqlStore;
use api::models::{NewUser, Role};
use api::router::PageRouter;
use api::settings::DatabaseSettings;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::TimeDelta;
use tower::ServiceExt;
use web::cookie::CookieConfig;
use web::AppState;

struct TestApp {
    app: Router,
    abey_id: i64,
    album_id: i64,
}

async fn setup() -> TestApp {
    let store = SqlStore::connect(&DatabaseSettings::in_memory()).await.unwrap();
    let passwords = Passwords::default().with_params(HashParams::new(1024, 1, 1, None).unwrap());

    let mut ids = Vec::new();
    for (name, username, password, role) in [
        ("Administrator", "admin", "adminpw", Role::Admin),
        ("Abey", "abey", "abeypw", Role::Regular),
        ("Bob", "bob", "bobpw", Role::Regular),
    ] {
        let id = store
            .insert_user(&NewUser {
                name: name.into(),
                username: username.into(),
                password_hash: passwords.hash(password).unwrap(),
                role,
            })
            .await
            .unwrap();
        ids.push(id);
    }
    let abey_id = ids[1];

    // row carried over from an older schema, hash is not a PHC string
    store
        .insert_user(&NewUser {
            name: "Legacy".into(),
            username: "legacy".into(),
            password_hash: "d033e22ae348aeb5660fc2140aec35850c4da997".into(),
            role: Role::Regular,
        })
        .await
        .unwrap();

    let album: (i64,) =
        sqlx::query_as("INSERT INTO album (name, id_user) VALUES ('Holidays', ?) RETURNING id")
            .bind(abey_id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    sqlx::query("INSERT INTO image (name, id_user, id_album) VALUES ('beach.jpg', ?, ?)")
        .bind(abey_id)
        .bind(album.0)
        .execute(store.pool())
        .await
        .unwrap();

    let ttl = TimeDelta::seconds(120);
    let sessions = SessionManager::new(store.clone(), passwords, ttl).unwrap();
    let router = PageRouter::new(store).unwrap();
    let state = AppState::new(
        sessions,
        router,
        CookieConfig {
            secure: false,
            max_age_secs: 120,
        },
    );

    TestApp {
        app: web::app(state),
        abey_id,
        album_id: album.0,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("sessionToken={token}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn login(&self, username: &str, password: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))
            .unwrap();
        self.send(request).await
    }

    /// Log in and return the session token from `Set-Cookie`.
    async fn token(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = set_cookie(&response);
        cookie
            .trim_start_matches("sessionToken=")
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn set_cookie(response: &Response<Body>) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string()
}

async fn body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_login_sets_cookie_and_redirects_to_landing() {
    let t = setup().await;

    let response = t.login("abey", "abeypw").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/user/view?id={}", t.abey_id));

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("sessionToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=120"));
    assert!(!cookie.contains("Secure"));

    let admin = t.login("admin", "adminpw").await;
    assert_eq!(location(&admin), "/dashboard");
}

#[tokio::test]
async fn test_failed_logins_look_the_same() {
    let t = setup().await;

    let unknown = t.login("nobody", "whatever").await;
    let wrong = t.login("abey", "wrong").await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(unknown.headers().get(header::SET_COOKIE).is_none());

    let unknown = body(unknown).await;
    assert!(unknown.contains("Invalid username or password"));
    assert_eq!(unknown, body(wrong).await);
}

#[tokio::test]
async fn test_unreadable_stored_hash_looks_like_bad_password() {
    let t = setup().await;

    let legacy = t.login("legacy", "admin").await;
    let unknown = t.login("nobody", "admin").await;
    assert_eq!(legacy.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(legacy).await, body(unknown).await);
}

#[tokio::test]
async fn test_pages_redirect_anonymous_callers_to_login() {
    let t = setup().await;

    for uri in [
        "/dashboard".to_string(),
        format!("/user/view?id={}", t.abey_id),
        format!("/album/view?id={}&owner={}", t.album_id, t.abey_id),
    ] {
        let response = t.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login");
    }

    let bogus = t.get("/dashboard", Some("not-a-session")).await;
    assert_eq!(location(&bogus), "/login");
}

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let t = setup().await;

    let admin = t.token("admin", "adminpw").await;
    let response = t.get("/dashboard", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("Administrator"));
    assert!(html.contains(&format!("/user/view?id={}", t.abey_id)));
    assert!(html.contains("Bob"));

    let abey = t.token("abey", "abeypw").await;
    let response = t.get("/dashboard", Some(&abey)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_regular_user_browses_own_albums_only() {
    let t = setup().await;
    let abey = t.token("abey", "abeypw").await;
    let bob = t.token("bob", "bobpw").await;

    let albums = t
        .get(&format!("/user/view?id={}&name=%3Cscript%3E", t.abey_id), Some(&abey))
        .await;
    assert_eq!(albums.status(), StatusCode::OK);
    let html = body(albums).await;
    assert!(html.contains("<h1>Abey</h1>"));
    assert!(html.contains("Holidays"));
    assert!(!html.contains("<script>"));

    // owner defaults to the caller
    let images = t
        .get(&format!("/album/view?id={}", t.album_id), Some(&abey))
        .await;
    assert_eq!(images.status(), StatusCode::OK);
    assert!(body(images).await.contains("beach.jpg"));

    let foreign = t
        .get(&format!("/user/view?id={}", t.abey_id), Some(&bob))
        .await;
    assert_eq!(location(&foreign), "/login");

    let foreign = t
        .get(&format!("/album/view?id={}", t.album_id), Some(&bob))
        .await;
    assert_eq!(location(&foreign), "/login");
}

#[tokio::test]
async fn test_admin_drills_into_any_album() {
    let t = setup().await;
    let admin = t.token("admin", "adminpw").await;

    let response = t
        .get(
            &format!("/album/view?id={}&owner={}", t.album_id, t.abey_id),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("<h1>Holidays</h1>"));
    assert!(html.contains("beach.jpg"));
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let t = setup().await;
    let token = t.token("abey", "abeypw").await;
    let page = format!("/user/view?id={}", t.abey_id);
    assert_eq!(t.get(&page, Some(&token)).await.status(), StatusCode::OK);

    let response = t.get("/logout", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cleared = set_cookie(&response);
    assert!(cleared.starts_with("sessionToken=;"));
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(location(&t.get(&page, Some(&token)).await), "/login");

    // already logged out
    let again = t.get("/logout", Some(&token)).await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&again), "/login");
    assert_eq!(location(&t.get("/logout", None).await), "/login");
}

#[tokio::test]
async fn test_new_login_replaces_old_session() {
    let t = setup().await;
    let first = t.token("abey", "abeypw").await;
    let second = t.token("abey", "abeypw").await;
    assert_ne!(first, second);

    let page = format!("/user/view?id={}", t.abey_id);
    assert_eq!(location(&t.get(&page, Some(&first)).await), "/login");
    assert_eq!(t.get(&page, Some(&second)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_page_redirects_when_logged_in() {
    let t = setup().await;
    assert_eq!(t.get("/", None).await.status(), StatusCode::OK);

    let admin = t.token("admin", "adminpw").await;
    let response = t.get("/login", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_state_endpoint() {
    let t = setup().await;

    let response = t.get("/api/state", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = serde_json::from_str(&body(response).await).unwrap();
    assert_eq!(json["status"], "unauthorized");

    let abey = t.token("abey", "abeypw").await;
    let response = t.get("/api/state", Some(&abey)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body(response).await).unwrap();
    assert_eq!(json["page"], "albums");
    assert_eq!(json["scope_owner_id"], t.abey_id);
    assert_eq!(json["title"], "Abey");
}

use blog_portal::{
    AppConfig, AppState, create_router, db,
    repository::{RepositoryState, SqliteRepository},
};
use reqwest::{Client, Response, StatusCode, header, redirect::Policy};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub pool: sqlx::SqlitePool,
}

/// Serves the full router (sessions, layers, static files) on a random port,
/// backed by a private in-memory database.
async fn spawn_app() -> TestApp {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database in tests");
    db::migrate(&pool).await.expect("Failed to migrate");

    let repo = Arc::new(SqliteRepository::new(pool.clone())) as RepositoryState;
    let state = AppState {
        repo,
        config: AppConfig::default(),
    };
    let router = create_router(state, MemoryStore::default());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, pool }
}

/// One browser: keeps its session cookie and does not follow redirects.
fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.expect("get failed")
    }

    async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("post failed")
    }

    async fn register(&self, client: &Client, email: &str, password: &str, name: &str) -> Response {
        self.post_form(
            client,
            "/register",
            &[("email", email), ("password", password), ("name", name)],
        )
        .await
    }

    async fn login(&self, client: &Client, email: &str, password: &str) -> Response {
        self.post_form(client, "/login", &[("email", email), ("password", password)])
            .await
    }

    async fn create_post(&self, client: &Client, title: &str) -> Response {
        self.post_form(
            client,
            "/new-post",
            &[
                ("title", title),
                ("subtitle", "S"),
                ("body", "<p>B</p>"),
                ("img_url", "http://x/i.png"),
            ],
        )
        .await
    }

    async fn post_id_by_title(&self, title: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT id FROM blog_posts WHERE title = ?")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .expect("post should exist")
    }

    async fn comment_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.get(&browser(), "/health").await;
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_static_pages_and_assets() {
    let app = spawn_app().await;
    let client = browser();

    for path in ["/", "/about", "/contact", "/login", "/register"] {
        let response = app.get(&client, path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
    }
    let css = app.get(&client, "/static/css/styles.css").await;
    assert_eq!(css.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_and_post_are_not_found() {
    let app = spawn_app().await;
    let client = browser();

    assert_eq!(app.get(&client, "/nope").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&client, "/post/999").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&client, "/post/abc").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repeated_notice_keys_still_render_the_page() {
    let app = spawn_app().await;
    let client = browser();

    let home = app.get(&client, "/?notice=a&notice=b").await;
    assert_eq!(home.status(), StatusCode::OK);
    let login = app.get(&client, "/login?notice=x&notice=y").await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_logs_in_and_logout_clears_session() {
    let app = spawn_app().await;
    let client = browser();

    let response = app.register(&client, "a@x.com", "pw1", "Alice").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let home = app.get(&client, "/").await.text().await.unwrap();
    assert!(home.contains("Signed in as Alice"));
    assert!(home.contains("Log Out"));

    let response = app.get(&client, "/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?notice=logged_out");

    let home = app
        .get(&client, location(&response))
        .await
        .text()
        .await
        .unwrap();
    assert!(!home.contains("Signed in as"));
    assert!(home.contains("You have been logged out."));
}

#[tokio::test]
async fn test_duplicate_registration_redirects_to_login() {
    let app = spawn_app().await;

    app.register(&browser(), "a@x.com", "pw1", "Alice").await;

    let client = browser();
    let response = app.register(&client, "a@x.com", "pw2", "Mallory").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?notice=existing_account");

    let page = app
        .get(&client, "/login?notice=existing_account")
        .await
        .text()
        .await
        .unwrap();
    assert!(page.contains("There is an existing user with this email!"));

    // The original password still works and the new one does not.
    let ok = app.login(&browser(), "a@x.com", "pw1").await;
    assert_eq!(ok.status(), StatusCode::SEE_OTHER);
    let bad = app.login(&browser(), "a@x.com", "pw2").await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures_share_a_message() {
    let app = spawn_app().await;
    app.register(&browser(), "a@x.com", "pw1", "Alice").await;

    let wrong_password = app.login(&browser(), "a@x.com", "nope").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = wrong_password.text().await.unwrap();

    let unknown = app.login(&browser(), "ghost@x.com", "pw1").await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown = unknown.text().await.unwrap();

    assert!(wrong_password.contains("Please try again! Wrong credentials"));
    assert!(unknown.contains("Please try again! Wrong credentials"));
}

#[tokio::test]
async fn test_anonymous_comment_redirects_to_login() {
    let app = spawn_app().await;
    let admin = browser();
    app.register(&admin, "admin@x.com", "pw", "Admin").await;
    app.create_post(&admin, "T").await;
    let post_id = app.post_id_by_title("T").await;

    let response = app
        .post_form(&browser(), &format!("/post/{post_id}/comment"), &[("text", "hi")])
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?notice=login_required");
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_readers_and_anonymous() {
    let app = spawn_app().await;
    let admin = browser();
    app.register(&admin, "admin@x.com", "pw", "Admin").await;
    app.create_post(&admin, "Existing").await;
    let post_id = app.post_id_by_title("Existing").await;

    let reader = browser();
    app.register(&reader, "b@x.com", "pw", "Bob").await;

    for client in [&reader, &browser()] {
        assert_eq!(app.get(client, "/new-post").await.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            app.create_post(client, "Sneaky").await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.get(client, &format!("/edit-post/{post_id}")).await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.post_form(
                client,
                &format!("/edit-post/{post_id}"),
                &[
                    ("title", "Hijacked"),
                    ("subtitle", "S"),
                    ("body", "<p>B</p>"),
                    ("img_url", "http://x/i.png"),
                ],
            )
            .await
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.get(client, &format!("/delete/{post_id}")).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    let titles: Vec<String> = sqlx::query_scalar("SELECT title FROM blog_posts")
        .fetch_all(&app.pool)
        .await
        .unwrap();
    assert_eq!(titles, vec!["Existing".to_string()]);
}

#[tokio::test]
async fn test_reader_comment_scenario() {
    let app = spawn_app().await;
    let admin = browser();
    app.register(&admin, "admin@x.com", "pw", "Admin").await;
    app.create_post(&admin, "T").await;
    let post_id = app.post_id_by_title("T").await;

    let reader = browser();
    app.register(&reader, "b@x.com", "pw", "B").await;
    let response = app
        .post_form(&reader, &format!("/post/{post_id}/comment"), &[("text", "hi")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/post/{post_id}"));

    let page = app
        .get(&browser(), &format!("/post/{post_id}"))
        .await
        .text()
        .await
        .unwrap();
    assert!(page.contains("<p class=\"mb-1\">hi</p>"));
    assert!(page.contains("gravatar.com/avatar/"));
    assert!(page.contains(">B</span>"));
}

#[tokio::test]
async fn test_blank_comment_is_rejected() {
    let app = spawn_app().await;
    let admin = browser();
    app.register(&admin, "admin@x.com", "pw", "Admin").await;
    app.create_post(&admin, "T").await;
    let post_id = app.post_id_by_title("T").await;

    let response = app
        .post_form(&admin, &format!("/post/{post_id}/comment"), &[("text", "   ")])
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("A comment cannot be empty."));
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn test_admin_create_edit_delete_scenario() {
    let app = spawn_app().await;
    let admin = browser();
    app.register(&admin, "admin@x.com", "pw", "Admin").await;

    let response = app.create_post(&admin, "T").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let post_id = app.post_id_by_title("T").await;

    let editor = app
        .get(&admin, &format!("/edit-post/{post_id}"))
        .await
        .text()
        .await
        .unwrap();
    assert!(editor.contains("value=\"T\""));

    let response = app
        .post_form(
            &admin,
            &format!("/edit-post/{post_id}"),
            &[
                ("title", "T2"),
                ("subtitle", "S"),
                ("body", "<p>B</p>"),
                ("img_url", "http://x/i.png"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/post/{post_id}"));

    let page = app
        .get(&browser(), &format!("/post/{post_id}"))
        .await
        .text()
        .await
        .unwrap();
    assert!(page.contains("<h1>T2</h1>"));
    assert!(page.contains("Posted by Admin"));

    app.post_form(&admin, &format!("/post/{post_id}/comment"), &[("text", "bye")])
        .await;
    let response = app.get(&admin, &format!("/delete/{post_id}")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?notice=post_deleted");

    assert_eq!(
        app.get(&browser(), &format!("/post/{post_id}")).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_title_rerenders_editor() {
    let app = spawn_app().await;
    let admin = browser();
    app.register(&admin, "admin@x.com", "pw", "Admin").await;
    app.create_post(&admin, "T").await;

    let response = app.create_post(&admin, "T").await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("A post with this title already exists.")
    );
}

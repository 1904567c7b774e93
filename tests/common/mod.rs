#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement,
};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::Once;
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static DB_PREPARED: OnceCell<()> = OnceCell::const_new();

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // No throttling inside tests
        std::env::set_var("RATE_LIMIT_ENABLED", "0");
        let config = pinstack::config::jwt::JwtConfig::from_env().unwrap();
        let _ = pinstack::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    /// Upload directory unique to this app instance.
    pub upload_dir: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and clean once per process. Tests run on parallel threads
    // against the same database, so each test scopes its fixtures with
    // unique usernames and emails instead of truncating mid-run.
    DB_PREPARED
        .get_or_init(|| async {
            pinstack::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    // The bound port doubles as a per-app key for the upload directory,
    // keeping concurrently running tests out of each other's files.
    let upload_dir = format!("./test_uploads/app_{}", addr.port());
    let upload_config = pinstack::services::upload::UploadConfig {
        upload_dir: upload_dir.clone(),
    };
    let email_service = pinstack::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(pinstack::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(upload_config))
        .layer(axum::extract::Extension(email_service));

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
        upload_dir,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = ["saved_posts", "likes", "posts", "users"];
    for table in tables {
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table),
            ))
            .await;
    }
}

/// Register a user through the API and return their id.
pub async fn register_user(app: &TestApp, username: &str, email: &str, password: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "registration failed for {}", username);

    user_id_by_email(app, email).await
}

/// Register and flip verification directly in the store, so tests that are
/// not about the verification flow can log in immediately.
pub async fn register_verified_user(
    app: &TestApp,
    username: &str,
    email: &str,
    password: &str,
) -> i32 {
    let user_id = register_user(app, username, email, password).await;

    let token = pinstack::utils::encode_verification_token(user_id).unwrap();
    let resp = app
        .client
        .get(app.url(&format!("/verify/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    user_id
}

pub async fn user_id_by_email(app: &TestApp, email: &str) -> i32 {
    pinstack::models::User::find()
        .filter(pinstack::models::user::Column::Email.eq(email))
        .one(&app.db)
        .await
        .unwrap()
        .expect("user not found")
        .id
}

pub async fn reset_token_for(app: &TestApp, email: &str) -> String {
    pinstack::models::User::find()
        .filter(pinstack::models::user::Column::Email.eq(email))
        .one(&app.db)
        .await
        .unwrap()
        .expect("user not found")
        .reset_token
        .expect("no reset token stored")
}

/// Minimal valid PNG payload (magic bytes plus filler).
pub fn png_bytes() -> Vec<u8> {
    png_bytes_sized(24)
}

/// PNG magic bytes padded with filler up to `total_len`.
pub fn png_bytes_sized(total_len: usize) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(total_len.max(data.len()), 0);
    data
}

/// Number of files currently under this app's posts upload directory.
pub fn stored_post_images(app: &TestApp) -> usize {
    match std::fs::read_dir(std::path::Path::new(&app.upload_dir).join("posts")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

/// Build the multipart form for POST /posts.
pub fn post_form(title: &str, user_id: i32, image: Option<Vec<u8>>) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("user_id", user_id.to_string());
    if let Some(bytes) = image {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("photo.png")
            .mime_str("image/png")
            .unwrap();
        form = form.part("image", part);
    }
    form
}

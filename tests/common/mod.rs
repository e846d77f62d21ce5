#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use organic_farm::auth::{create_jwt, hash_password};
use organic_farm::config::Config;
use organic_farm::models::{farmer, product, user};
use organic_farm::{db, server, AppState};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const PASSWORD: &str = "TestPass123";
pub const BOUNDARY: &str = "organic-farm-test-boundary";

/// Smallest header `image::guess_format` recognises as PNG
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn setup() -> TestApp {
    setup_with(|_| {}).await
}

pub async fn setup_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let uploads = tempfile::tempdir().expect("Failed to create upload dir");

    let mut config = Config {
        upload_dir: uploads.path().to_string_lossy().into_owned(),
        rate_limit_per_minute: 0,
        ..Config::default()
    };
    configure(&mut config);

    let state = AppState::new(db, config);
    let app = server::build_router(state.clone());
    TestApp { app, state, uploads }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        self.state.db()
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn empty(&self, method: Method, uri: &str, token: Option<&str>) -> Response {
        self.send(request(method, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.send(
            request(method, uri, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> Response {
        self.send(
            request(method, uri, token)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(fields, file)))
                .unwrap(),
        )
        .await
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        create_jwt(
            &self.state.config.secret_key,
            &user.email,
            &user.role,
            chrono::Duration::minutes(30),
        )
        .unwrap()
    }

    /// Admin account with its own farmer profile, plus a token
    pub async fn admin(&self) -> (user::Model, String) {
        let farmer = create_farmer(self.db(), "Community Admin").await;
        let admin = create_user(self.db(), "admin@test.com", "admin", Some(farmer.id)).await;
        let token = self.token_for(&admin);
        (admin, token)
    }

    /// Farmer profile, its login and a token
    pub async fn farmer(&self, email: &str) -> (farmer::Model, user::Model, String) {
        let farmer = create_farmer(self.db(), &format!("Farmer {}", email)).await;
        let user = create_user(self.db(), email, "farmer", Some(farmer.id)).await;
        let token = self.token_for(&user);
        (farmer, user, token)
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn create_farmer(db: &DatabaseConnection, name: &str) -> farmer::Model {
    farmer::ActiveModel {
        name: Set(name.to_string()),
        location: Set("Green Valley".to_string()),
        bio: Set(Some("Growing vegetables since 1990".to_string())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create farmer")
}

pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    role: &str,
    farmer_id: Option<i32>,
) -> user::Model {
    user::ActiveModel {
        email: Set(email.to_string()),
        hashed_password: Set(hash_password(PASSWORD).unwrap()),
        role: Set(role.to_string()),
        farmer_id: Set(farmer_id),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn create_product(
    db: &DatabaseConnection,
    farmer_id: i32,
    name: &str,
    stock_qty: f64,
) -> product::Model {
    product::ActiveModel {
        name: Set(name.to_string()),
        price: Set(4.0),
        unit: Set("kg".to_string()),
        stock_qty: Set(stock_qty),
        is_organic: Set(true),
        farmer_id: Set(farmer_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create product")
}

pub fn order_payload(items: &[(i32, i32)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(product_id, quantity)| {
            serde_json::json!({ "product_id": product_id, "quantity": quantity, "price": 4.0 })
        })
        .collect();
    serde_json::json!({
        "customer_name": "Asha Rao",
        "customer_email": "Asha@Example.com",
        "address": "12 Lake View Road, Bengaluru",
        "total_price": 20.0,
        "items": items
    })
}

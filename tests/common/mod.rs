use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use peakform_api::{
    config::AppConfig,
    db,
    entities::{program, user, ProgramLevel, ProgramModel, UserModel, UserRole},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Secret the test provider signatures are computed with.
pub const TEST_RAZORPAY_SECRET: &str = "test_razorpay_secret_key";

/// Helper harness spinning up application state over a temporary SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("peakform_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_long_enough".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.razorpay_key_id = "rzp_test_key".to_string();
        cfg.razorpay_key_secret = TEST_RAZORPAY_SECRET.to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()), &cfg)
            .expect("failed to build services for tests");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", peakform_api::api_v1_routes())
            .nest("/auth", peakform_api::handlers::auth::auth_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Insert a user directly and return it with a valid access token.
    pub async fn seed_user(&self, email: &str, role: UserRole) -> (UserModel, String) {
        let now = Utc::now();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            name: Set("Test User".to_string()),
            password_hash: Set(None),
            avatar_url: Set(None),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user for tests");

        let tokens = self
            .state
            .services
            .auth
            .issue_tokens(&user)
            .expect("issue tokens for seeded user");

        (user, tokens.access_token)
    }

    /// Insert a catalog program with the given title and price.
    pub async fn seed_program(&self, title: &str, price: Decimal) -> ProgramModel {
        let now = Utc::now();
        program::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(format!("{title} description")),
            price: Set(price),
            original_price: Set(None),
            level: Set(ProgramLevel::Beginner),
            category: Set("strength".to_string()),
            instructor: Set("Maya Rios".to_string()),
            rating: Set(Decimal::ZERO),
            students_count: Set(0),
            duration: Set("8 weeks".to_string()),
            image_url: Set(None),
            features: Set(serde_json::json!(["progressive overload"])),
            tags: Set(serde_json::json!(["strength"])),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed program for tests")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Read a response body as JSON, asserting the expected status first.
pub async fn json_body(response: axum::response::Response, expected: StatusCode) -> Value {
    assert_eq!(response.status(), expected, "unexpected response status");
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    }
}

/// Build a cart sync payload for the given (program, quantity) pairs.
pub fn cart_sync_payload(lines: &[(&ProgramModel, i32)], promo: Option<&str>) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(program, quantity)| {
            serde_json::json!({
                "id": program.id,
                "title": program.title,
                "price": program.price,
                "duration": program.duration,
                "instructor": program.instructor,
                "category": program.category,
                "quantity": quantity,
            })
        })
        .collect();

    let total_items: i32 = lines.iter().map(|(_, q)| q).sum();
    let total_amount: Decimal = lines
        .iter()
        .map(|(p, q)| p.price * Decimal::from(*q))
        .sum();

    serde_json::json!({
        "items": items,
        "totalItems": total_items,
        "totalAmount": total_amount,
        "appliedPromo": promo,
        "discountAmount": 0,
    })
}

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use rider_client::config::Config;
use rider_client::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const EMAIL: &str = "judas@example.com";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "tok-1";
pub const USER_ID: &str = "u-42";
pub const COURIER: &str = "Judas";
pub const DELIVERY_OTP: &str = "1234";
pub const LOGIN_OTP: &str = "4321";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
    pub auth: Option<String>,
}

#[derive(Default)]
pub struct MockBackend {
    pub orders: Mutex<Vec<Value>>,
    pub failing: Mutex<HashSet<String>>,
    pub locations_down: AtomicBool,
    pub calls: Mutex<Vec<Recorded>>,
}

impl MockBackend {
    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.calls.lock().unwrap().push(Recorded {
            method,
            path,
            body,
            auth,
        });
    }

    pub fn calls_to(&self, prefix: &str) -> Vec<Recorded> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn fail_patches_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_location_updates(&self) {
        self.locations_down.store(true, Ordering::SeqCst);
    }
}

type Shared = State<Arc<MockBackend>>;

async fn list_orders(State(mock): Shared) -> Json<Value> {
    Json(Value::Array(mock.orders.lock().unwrap().clone()))
}

async fn patch_order(
    State(mock): Shared,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(
        "PATCH",
        format!("/delikaquickshipper_orders_table/{id}"),
        &headers,
        body.clone(),
    );
    if mock.failing.lock().unwrap().contains(&id) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        );
    }
    (StatusCode::OK, Json(json!({ "id": id, "orderStatus": body["orderStatus"] })))
}

async fn validate_otp(
    State(mock): Shared,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    mock.record("POST", "/validate_otp".to_string(), &headers, body.clone());
    if body["otp"] == DELIVERY_OTP {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

async fn login(State(mock): Shared, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record("POST", "/auth/login".to_string(), &headers, body.clone());
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        (StatusCode::OK, Json(json!({ "authToken": TOKEN })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad credentials" })))
    }
}

async fn me(State(mock): Shared, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    mock.record("GET", "/auth/me".to_string(), &headers, Value::Null);
    let xano = headers
        .get("x-xano-authorization")
        .and_then(|v| v.to_str().ok());
    let expected = format!("Bearer {TOKEN}");
    if xano != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": USER_ID,
            "fullName": COURIER,
            "email": EMAIL,
            "phoneNumber": "0240000000",
            "address": "Osu, Accra",
            "role": "Rider"
        })),
    )
}

async fn recorded_patch(
    State(mock): Shared,
    Path(rest): Path<String>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
    prefix: &'static str,
) -> StatusCode {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    mock.record("PATCH", format!("/{prefix}/{rest}"), &headers, body);
    StatusCode::OK
}

async fn device(state: Shared, path: Path<String>, headers: HeaderMap, body: Option<Json<Value>>) -> StatusCode {
    recorded_patch(state, path, headers, body, "deviceID").await
}

async fn logout(state: Shared, path: Path<String>, headers: HeaderMap) -> StatusCode {
    recorded_patch(state, path, headers, None, "logout").await
}

async fn rider_update(state: Shared, path: Path<String>, headers: HeaderMap, body: Option<Json<Value>>) -> StatusCode {
    recorded_patch(state, path, headers, body, "riderupdate").await
}

async fn location_update(state: Shared, path: Path<String>, headers: HeaderMap, body: Option<Json<Value>>) -> StatusCode {
    let down = state.0.locations_down.load(Ordering::SeqCst);
    let status = recorded_patch(state, path, headers, body, "locationupdate").await;
    if down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        status
    }
}

async fn edit_status(State(mock): Shared, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    mock.record("PATCH", "/editStatus".to_string(), &headers, body);
    StatusCode::OK
}

async fn send_otp_email(State(mock): Shared, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    mock.record("POST", "/reset/user/password/email".to_string(), &headers, body);
    StatusCode::OK
}

async fn verify_otp(State(mock): Shared, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    mock.record("POST", "/verify/otp/code".to_string(), &headers, body.clone());
    if body["code"] == LOGIN_OTP {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

fn router(mock: Arc<MockBackend>) -> Router {
    Router::new()
        .route("/delikaquickshipper_orders_table", get(list_orders))
        .route("/delikaquickshipper_orders_table/:id", patch(patch_order))
        .route("/validate_otp", post(validate_otp))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/deviceID/:id", patch(device))
        .route("/reset/user/password/email", post(send_otp_email))
        .route("/verify/otp/code", post(verify_otp))
        .route("/logout/:id", patch(logout))
        .route("/riderupdate/:id", patch(rider_update))
        .route("/editStatus", patch(edit_status))
        .route("/locationupdate/:id", patch(location_update))
        .with_state(mock)
}

pub struct Harness {
    pub mock: Arc<MockBackend>,
    pub state: AppState,
    _dir: TempDir,
}

impl Harness {
    pub async fn start(orders: Vec<Value>) -> Self {
        let mock = Arc::new(MockBackend::default());
        *mock.orders.lock().unwrap() = orders;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(mock.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_base_url(format!("http://{addr}"), dir.path().join("session.json"));
        let state = AppState::init(config).await.unwrap();

        Self {
            mock,
            state,
            _dir: dir,
        }
    }

    pub async fn signed_in(orders: Vec<Value>) -> Self {
        let harness = Self::start(orders).await;
        harness.state.backend.login(EMAIL, PASSWORD).await.unwrap();
        harness.mock.calls.lock().unwrap().clear();
        harness
    }
}

pub fn order(id: &str, number: i64, status: &str, batch: Option<&str>) -> Value {
    json!({
        "id": id,
        "created_at": "2024-05-01T08:00:00Z",
        "orderNumber": number,
        "orderStatus": status,
        "courierName": COURIER,
        "customerName": "Ama",
        "customerPhoneNumber": "0240000001",
        "deliveryPrice": 15,
        "pickup": [{"fromLatitude": 5.6037, "fromLongitude": -0.187, "fromAddress": "Osu, Accra"}],
        "dropOff": [{"toLatitude": 5.61, "toLongitude": -0.19, "toAddress": "Labone, Accra"}],
        "products": [{"name": "Jollof", "quantity": 1, "price": 40}],
        "batchID": batch,
        "orderReceivedTime": "2024-05-01T08:01:00Z"
    })
}

//! Integration tests for Cartstorm.
//!
//! The tests run the real load generator against [`MockShop`], an in-process
//! axum server that speaks the shop API's wire format and records every
//! request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartstorm-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cartstorm_core::{
    CartRequest, Credentials, OrderRequest, PaymentRequest, ShippingRequest, UserRegistration,
    endpoint,
};
use cartstorm_loadtest::{LoadTest, LoadTestConfig, LoadTestError, Profile, RunSummary, profile};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Token handed out by a successful login.
pub const MOCK_TOKEN: &str = "mock.jwt.token";

/// Highest product ID that exists; larger IDs answer `404`.
pub const PRODUCT_COUNT: i64 = 50;
/// Highest user ID that exists.
pub const USER_COUNT: i64 = 100;
/// Highest order ID that exists.
pub const ORDER_COUNT: i64 = 500;

/// How `POST /authenticate` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    /// `200` with a token for the right credentials, `401` otherwise.
    #[default]
    Token,
    /// Always `401`.
    Unauthorized,
    /// `200` without a `jwtToken` field.
    NoToken,
}

/// Switches that make the mock misbehave.
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    pub login: LoginMode,
    /// Answer create requests with plain text instead of JSON IDs.
    pub plain_text_bodies: bool,
    /// Answer every registration with `409 Conflict`.
    pub registration_conflict: bool,
    /// Answer every request except login with this status.
    pub fail_with: Option<StatusCode>,
    /// Apply `fail_with` to this path only, login included.
    pub fail_path: Option<&'static str>,
    /// Delay before every response.
    pub latency: Duration,
    /// Hand out `0` as every cart and order ID.
    pub zero_ids: bool,
}

/// A request as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    /// Whether the request carried `Authorization: Bearer <MOCK_TOKEN>`.
    pub authorized: bool,
    /// JSON body of `POST` requests that reached a handler.
    pub body: Option<Value>,
    /// When the request arrived.
    pub at: Instant,
}

#[derive(Clone)]
struct ShopState {
    inner: Arc<ShopInner>,
}

struct ShopInner {
    behaviour: Behaviour,
    requests: Mutex<Vec<Recorded>>,
    next_id: AtomicI64,
    issued_carts: Mutex<Vec<i64>>,
    issued_orders: Mutex<Vec<i64>>,
}

impl ShopState {
    fn record(&self, recorded: Recorded) -> usize {
        let mut requests = self
            .inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        requests.push(recorded);
        requests.len() - 1
    }

    fn attach_body<T: Serialize>(&self, index: usize, body: &T) {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        let mut requests = self
            .inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(recorded) = requests.get_mut(index) {
            recorded.body = Some(body);
        }
    }

    fn next_id(&self) -> i64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Cart and order IDs, zeroed when the behaviour asks for it.
    fn issue_id(&self) -> i64 {
        if self.inner.behaviour.zero_ids {
            0
        } else {
            self.next_id()
        }
    }
}

/// Index of the recorded request, passed from the middleware to the handler.
#[derive(Clone, Copy)]
struct RequestIndex(usize);

/// The mock shop API, listening on an ephemeral localhost port until dropped.
pub struct MockShop {
    addr: SocketAddr,
    state: ShopState,
    server: JoinHandle<()>,
}

impl MockShop {
    /// Start a well-behaved mock.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(Behaviour::default()).await
    }

    /// Start a mock with the given behaviour.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start_with(behaviour: Behaviour) -> std::io::Result<Self> {
        let state = ShopState {
            inner: Arc::new(ShopInner {
                behaviour,
                requests: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
                issued_carts: Mutex::new(Vec::new()),
                issued_orders: Mutex::new(Vec::new()),
            }),
        };

        let app = Router::new()
            .route(endpoint::AUTHENTICATE, post(authenticate))
            .route(endpoint::PRODUCTS, get(list))
            .route(&format!("{}/{{id}}", endpoint::PRODUCTS), get(product))
            .route(endpoint::CATEGORIES, get(list))
            .route(endpoint::FAVOURITES, get(list))
            .route(endpoint::CARTS, post(create_cart))
            .route(endpoint::ORDERS, get(list).post(create_order))
            .route(&format!("{}/{{id}}", endpoint::ORDERS), get(order))
            .route(endpoint::PAYMENTS, post(create_payment))
            .route(endpoint::SHIPPINGS, post(create_shipping))
            .route(endpoint::USERS, post(register_user))
            .route(&format!("{}/{{id}}", endpoint::USERS), get(user))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the mock.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr))
            .unwrap_or_else(|_| unreachable!("socket address is a valid host"))
    }

    /// A configuration pointing at the mock: seeded, fast spawning, and
    /// `iterations` passes through the profile per user.
    #[must_use]
    pub fn config(&self, users: usize, iterations: usize) -> LoadTestConfig {
        LoadTestConfig {
            host: self.url(),
            users,
            spawn_rate: 1000.0,
            iterations: Some(iterations),
            request_timeout: Duration::from_secs(5),
            seed: Some(42),
            ..LoadTestConfig::default()
        }
    }

    /// Run `profiles` without think time until every user has made
    /// `iterations` passes through its profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the load test cannot start.
    pub async fn run(
        &self,
        profiles: Vec<Profile>,
        users: usize,
        iterations: usize,
    ) -> Result<RunSummary, LoadTestError> {
        self.run_with(self.config(users, iterations), profiles).await
    }

    /// Like [`MockShop::run`] with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the load test cannot start.
    pub async fn run_with(
        &self,
        config: LoadTestConfig,
        profiles: Vec<Profile>,
    ) -> Result<RunSummary, LoadTestError> {
        let profiles = profiles.into_iter().map(profile::without_wait).collect();
        Self::run_as_given(config, profiles).await
    }

    /// Run `profiles` with their own wait times.
    ///
    /// # Errors
    ///
    /// Returns an error if the load test cannot start.
    pub async fn run_as_given(
        config: LoadTestConfig,
        profiles: Vec<Profile>,
    ) -> Result<RunSummary, LoadTestError> {
        LoadTest::new(config, profiles)?.run().await
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state
            .inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for `path` with `method`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == *method && r.path == path)
            .collect()
    }

    /// Cart IDs handed out so far.
    #[must_use]
    pub fn issued_carts(&self) -> Vec<i64> {
        self.state
            .inner
            .issued_carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Order IDs handed out so far.
    #[must_use]
    pub fn issued_orders(&self) -> Vec<i64> {
        self.state
            .inner
            .issued_orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockShop {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Middleware and Handlers
// =============================================================================

async fn record_request(
    State(state): State<ShopState>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {MOCK_TOKEN}"));
    let index = state.record(Recorded {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        authorized,
        body: None,
        at: Instant::now(),
    });

    let behaviour = &state.inner.behaviour;
    if !behaviour.latency.is_zero() {
        tokio::time::sleep(behaviour.latency).await;
    }
    let path = request.uri().path();
    let failing = behaviour
        .fail_path
        .map_or(path != endpoint::AUTHENTICATE, |only| path == only);
    if let Some(status) = behaviour.fail_with
        && failing
    {
        return (status, "mock failure").into_response();
    }

    request.extensions_mut().insert(RequestIndex(index));
    next.run(request).await
}

async fn authenticate(
    State(state): State<ShopState>,
    axum::Extension(RequestIndex(index)): axum::Extension<RequestIndex>,
    Json(credentials): Json<Credentials>,
) -> Response {
    state.attach_body(index, &credentials);
    match state.inner.behaviour.login {
        LoginMode::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        LoginMode::NoToken => Json(json!({ "username": credentials.username })).into_response(),
        LoginMode::Token if credentials.password == "password123" => {
            Json(json!({ "jwtToken": MOCK_TOKEN })).into_response()
        }
        LoginMode::Token => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn list() -> Json<Value> {
    Json(json!([]))
}

fn by_id(id: i64, count: i64) -> Response {
    if (1..=count).contains(&id) {
        Json(json!({ "id": id })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn product(Path(id): Path<i64>) -> Response {
    by_id(id, PRODUCT_COUNT)
}

async fn order(Path(id): Path<i64>) -> Response {
    by_id(id, ORDER_COUNT)
}

async fn user(Path(id): Path<i64>) -> Response {
    by_id(id, USER_COUNT)
}

/// `201` with `{"<field>": id}`, or a plain-text `201` in text mode.
fn created(state: &ShopState, field: &str, id: i64) -> Response {
    if state.inner.behaviour.plain_text_bodies {
        (StatusCode::CREATED, "Created").into_response()
    } else {
        (StatusCode::CREATED, Json(json!({ field: id }))).into_response()
    }
}

async fn create_cart(
    State(state): State<ShopState>,
    axum::Extension(RequestIndex(index)): axum::Extension<RequestIndex>,
    Json(cart): Json<CartRequest>,
) -> Response {
    state.attach_body(index, &cart);
    let id = state.issue_id();
    state
        .inner
        .issued_carts
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(id);
    created(&state, "cartId", id)
}

async fn create_order(
    State(state): State<ShopState>,
    axum::Extension(RequestIndex(index)): axum::Extension<RequestIndex>,
    Json(order): Json<OrderRequest>,
) -> Response {
    state.attach_body(index, &order);
    let id = state.issue_id();
    state
        .inner
        .issued_orders
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(id);
    created(&state, "orderId", id)
}

async fn create_payment(
    State(state): State<ShopState>,
    axum::Extension(RequestIndex(index)): axum::Extension<RequestIndex>,
    Json(payment): Json<PaymentRequest>,
) -> Response {
    state.attach_body(index, &payment);
    let id = state.next_id();
    created(&state, "paymentId", id)
}

async fn create_shipping(
    State(state): State<ShopState>,
    axum::Extension(RequestIndex(index)): axum::Extension<RequestIndex>,
    Json(shipping): Json<ShippingRequest>,
) -> Response {
    state.attach_body(index, &shipping);
    let id = state.next_id();
    created(&state, "shippingId", id)
}

async fn register_user(
    State(state): State<ShopState>,
    axum::Extension(RequestIndex(index)): axum::Extension<RequestIndex>,
    Json(user): Json<UserRegistration>,
) -> Response {
    state.attach_body(index, &user);
    if state.inner.behaviour.registration_conflict {
        return (StatusCode::CONFLICT, "Username already taken").into_response();
    }
    let id = state.next_id();
    created(&state, "userId", id)
}

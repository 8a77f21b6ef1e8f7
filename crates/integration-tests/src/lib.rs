//! Integration test harness for the Karthik store.
//!
//! [`StubServer`] serves the store's JSON API from memory on an ephemeral
//! local port so the client managers can be exercised over real HTTP, and
//! can be switched into an outage to drive the local-fallback paths.
//!
//! # Running Tests
//!
//! ```bash
//! # Stub-backed tests
//! cargo test -p karthik-integration-tests
//!
//! # Tests against a live API server (needs the database and `karthik-api`)
//! cargo test -p karthik-integration-tests -- --ignored
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use karthik_client::{ApiClient, MemoryStore, RemoteError, Storefront};
use karthik_core::{
    AccountReply, AdminCredentials, AdminLoginReply, AdminUserId, DemoRequest, DemoRequestReply,
    DemoStatus, ErrorBody, MessageBody, NewDemoRequest, NewProduct, Product, ProductId,
    ProductUpdate, UserAction, UserProfile, UserRole, Username,
};

/// Request timeout used by clients built by this harness.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(2);

type StubResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;

fn reject<T>(status: StatusCode, message: &str) -> StubResult<T> {
    Err((status, Json(ErrorBody::new(message))))
}

#[derive(Default)]
struct StubData {
    products: Vec<Product>,
    /// Profiles with their plain-text passwords.
    users: Vec<(UserProfile, String)>,
    admins: Vec<(AdminUserId, String)>,
    /// In submission order.
    demo_requests: Vec<DemoRequest>,
    outage: Option<StatusCode>,
}

impl StubData {
    fn check_up(&self) -> StubResult<()> {
        match self.outage {
            Some(status) => reject(status, "Internal server error"),
            None => Ok(()),
        }
    }
}

type Shared = Arc<Mutex<StubData>>;

/// In-memory stand-in for the store API.
pub struct StubServer {
    addr: SocketAddr,
    data: Shared,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Start serving `products` on `127.0.0.1` with an OS-assigned port.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start(products: Vec<Product>) -> std::io::Result<Self> {
        let data: Shared = Arc::new(Mutex::new(StubData {
            products,
            ..StubData::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(data.clone());
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "stub server stopped");
            }
        });

        Ok(Self { addr, data, task })
    }

    /// Base URL of the stub.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("socket address is a valid URL")
    }

    /// Answer every request with `status` until cleared with `None`.
    pub async fn set_outage(&self, status: Option<StatusCode>) {
        self.data.lock().await.outage = status;
    }

    /// The stub's current catalog.
    pub async fn products(&self) -> Vec<Product> {
        self.data.lock().await.products.clone()
    }

    /// Provision an admin on the server side.
    pub async fn add_admin(&self, userid: &str, password: &str) {
        self.data
            .lock()
            .await
            .admins
            .push((AdminUserId::new(userid), password.to_owned()));
    }

    /// An API client pointed at this stub.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the client cannot be built.
    pub fn client(&self) -> Result<ApiClient, RemoteError> {
        ApiClient::new(self.url(), TEST_TIMEOUT)
    }

    /// A storefront backed by an in-memory store and this stub.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the client cannot be built.
    pub fn storefront(&self) -> Result<Storefront<MemoryStore>, RemoteError> {
        Ok(Storefront::new(MemoryStore::new(), self.client()?, None))
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A URL on which nothing is listening.
///
/// # Errors
///
/// Returns an I/O error if the temporary listener cannot be bound.
pub async fn unreachable_url() -> std::io::Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Url::parse(&format!("http://{addr}"))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

fn router(data: Shared) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/api/users", get(get_user).post(user_action))
        .route("/api/admin/login", post(admin_login))
        .route(
            "/api/demo-request",
            get(list_demo_requests).post(create_demo_request),
        )
        .with_state(data)
}

async fn list_products(State(data): State<Shared>) -> StubResult<Json<Vec<Product>>> {
    let data = data.lock().await;
    data.check_up()?;
    Ok(Json(data.products.clone()))
}

async fn create_product(
    State(data): State<Shared>,
    Json(product): Json<NewProduct>,
) -> StubResult<(StatusCode, Json<Product>)> {
    let mut data = data.lock().await;
    data.check_up()?;
    if let Err(e) = product.validate() {
        return reject(StatusCode::BAD_REQUEST, &e.to_string());
    }
    let product = product.into_product();
    data.products.push(product.clone());
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(data): State<Shared>,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> StubResult<Json<Product>> {
    let mut data = data.lock().await;
    data.check_up()?;
    let Some(product) = data.products.iter_mut().find(|p| p.id == id) else {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    };
    update.apply_to(product);
    Ok(Json(product.clone()))
}

async fn delete_product(
    State(data): State<Shared>,
    Path(id): Path<ProductId>,
) -> StubResult<Json<MessageBody>> {
    let mut data = data.lock().await;
    data.check_up()?;
    let before = data.products.len();
    data.products.retain(|p| p.id != id);
    if data.products.len() == before {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    }
    Ok(Json(MessageBody {
        message: "Product deleted".into(),
    }))
}

async fn user_action(
    State(data): State<Shared>,
    Json(action): Json<UserAction>,
) -> StubResult<(StatusCode, Json<AccountReply>)> {
    let mut data = data.lock().await;
    data.check_up()?;

    match action {
        UserAction::Register(registration) => {
            if data
                .users
                .iter()
                .any(|(u, _)| u.username == registration.username)
            {
                return reject(StatusCode::BAD_REQUEST, "Username already exists");
            }
            let now = Utc::now();
            let user = UserProfile {
                username: registration.username,
                full_name: registration.full_name,
                phone_number: registration.phone_number,
                email: registration.email,
                delivery_address: registration.delivery_address,
                permanent_address: registration.permanent_address,
                role: UserRole::User,
                created_at: now,
                updated_at: now,
            };
            data.users.push((user.clone(), registration.password));
            Ok((
                StatusCode::CREATED,
                Json(AccountReply {
                    success: true,
                    message: "User registered successfully".into(),
                    user,
                }),
            ))
        }
        UserAction::Login(credentials) => {
            let Some((user, _)) = data.users.iter().find(|(u, password)| {
                u.username == credentials.username && *password == credentials.password
            }) else {
                return reject(StatusCode::UNAUTHORIZED, "Invalid credentials");
            };
            Ok((
                StatusCode::OK,
                Json(AccountReply {
                    success: true,
                    message: "Login successful".into(),
                    user: user.clone(),
                }),
            ))
        }
    }
}

#[derive(Deserialize)]
struct UserQuery {
    username: Option<Username>,
}

async fn get_user(
    State(data): State<Shared>,
    Query(query): Query<UserQuery>,
) -> StubResult<Json<UserProfile>> {
    let data = data.lock().await;
    data.check_up()?;
    let Some(username) = query.username else {
        return reject(StatusCode::BAD_REQUEST, "Username parameter is required");
    };
    data.users
        .iter()
        .find(|(u, _)| u.username == username)
        .map(|(u, _)| Json(u.clone()))
        .map_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"), Ok)
}

async fn admin_login(
    State(data): State<Shared>,
    Json(credentials): Json<AdminCredentials>,
) -> StubResult<Json<AdminLoginReply>> {
    let data = data.lock().await;
    data.check_up()?;
    let known = data
        .admins
        .iter()
        .any(|(userid, password)| *userid == credentials.userid && *password == credentials.password);
    if !known {
        return reject(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    Ok(Json(AdminLoginReply {
        success: true,
        message: "Login successful".into(),
    }))
}

async fn create_demo_request(
    State(data): State<Shared>,
    Json(request): Json<NewDemoRequest>,
) -> StubResult<(StatusCode, Json<DemoRequestReply>)> {
    let mut data = data.lock().await;
    data.check_up()?;
    let email = match request.validate() {
        Ok(email) => email,
        Err(e) => return reject(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    let stored = DemoRequest {
        name: request.name,
        phone: request.phone,
        email,
        address: request.address,
        reason: request.reason,
        created_at: Utc::now(),
        status: DemoStatus::Pending,
    };
    data.demo_requests.push(stored.clone());
    Ok((
        StatusCode::CREATED,
        Json(DemoRequestReply {
            success: true,
            message: "Demo request submitted successfully".into(),
            data: stored,
        }),
    ))
}

async fn list_demo_requests(State(data): State<Shared>) -> StubResult<Json<Vec<DemoRequest>>> {
    let data = data.lock().await;
    data.check_up()?;
    Ok(Json(data.demo_requests.iter().rev().cloned().collect()))
}

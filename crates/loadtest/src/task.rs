//! Request patterns a simulated user runs.
//!
//! Each [`Task`] becomes one goose transaction: a single request or a short
//! chain of requests. Profiles combine tasks with relative weights in a
//! [`TaskMix`]; goose runs a task `weight` times per scenario iteration.

use std::fmt;
use std::sync::Arc;

use cartstorm_core::{
    CartCreated, CartId, CartRequest, OrderCreated, OrderId, OrderRequest, PaymentRequest,
    ProductId, StatusAllowList, UserId, UserRegistration, endpoint,
};
use goose::prelude::*;
use rand::Rng;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::session::{self, Check, Reply};
use crate::user::{UserSettings, state};

/// Invalid task weights.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskMixError {
    #[error("a task mix needs at least one task")]
    Empty,
    #[error("task {0} has weight 0")]
    ZeroWeight(Task),
}

/// A request pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// `GET /products`.
    BrowseProducts,
    /// `GET /products/{id}` for a random product that may not exist.
    ViewProductDetails,
    /// `GET /categories`.
    BrowseCategories,
    /// `GET /favourites`.
    ViewFavourites,
    /// Create a cart, then an order for it.
    CreateOrder,
    /// `GET /orders`.
    BrowseOrders,
    /// `GET /orders/{id}` for a random order that may not exist.
    ViewOrderDetails,
    /// Register a throwaway account.
    RegisterUser,
    /// Log in with the shared test account.
    LoginUser,
    /// `GET /users/{id}` for a random user.
    GetUserProfile,
    /// Browse the catalog and sometimes open a product.
    MixedBrowse,
    /// Create a cart and an order without checking the order outcome.
    MixedCreateOrder,
    /// `GET /users/{id}` without an allow-list.
    MixedUserLookup,
    /// Product, cart, order and payment in one iteration.
    QuickPurchase,
}

impl Task {
    /// Transaction name used in listings, logs and goose's transaction table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BrowseProducts => "browse_products",
            Self::ViewProductDetails => "view_product_details",
            Self::BrowseCategories => "browse_categories",
            Self::ViewFavourites => "view_favourites",
            Self::CreateOrder => "create_order",
            Self::BrowseOrders => "browse_orders",
            Self::ViewOrderDetails => "view_order_details",
            Self::RegisterUser => "register_user",
            Self::LoginUser => "login_user",
            Self::GetUserProfile => "get_user_profile",
            Self::MixedBrowse => "mixed_browse",
            Self::MixedCreateOrder => "mixed_create_order",
            Self::MixedUserLookup => "mixed_user_lookup",
            Self::QuickPurchase => "quick_purchase",
        }
    }

    /// Wrap this task in a named goose transaction.
    #[must_use]
    pub fn transaction(self, settings: &Arc<UserSettings>) -> Transaction {
        let settings = Arc::clone(settings);
        let run: TransactionFunction = Arc::new(move |user| {
            let settings = Arc::clone(&settings);
            Box::pin(async move { self.run(user, &settings).await })
        });
        Transaction::new(run).set_name(self.label())
    }

    /// Run one iteration of this task.
    ///
    /// Failed status checks are not errors; goose counts them. A success
    /// response the task depends on but cannot decode ends the task quietly.
    ///
    /// # Errors
    ///
    /// Returns an error only if goose could not build or record a request.
    pub async fn run(self, user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
        match self {
            Self::BrowseProducts => {
                get(user, "Browse Products", endpoint::PRODUCTS, StatusAllowList::OK).await
            }
            Self::ViewProductDetails => {
                let id = ProductId::new(state(user, settings).rng.random_range(1..=100));
                get(
                    user,
                    "View Product Details",
                    &endpoint::product(id),
                    StatusAllowList::OK_OR_NOT_FOUND,
                )
                .await
            }
            Self::BrowseCategories => {
                get(user, "Browse Categories", endpoint::CATEGORIES, StatusAllowList::OK).await
            }
            Self::ViewFavourites => {
                get(
                    user,
                    "View Favourites",
                    endpoint::FAVOURITES,
                    StatusAllowList::OK_OR_NOT_FOUND,
                )
                .await
            }
            Self::CreateOrder => create_order(user, settings).await,
            Self::BrowseOrders => {
                get(user, "Browse Orders", endpoint::ORDERS, StatusAllowList::OK).await
            }
            Self::ViewOrderDetails => {
                let id = OrderId::new(state(user, settings).rng.random_range(1..=1000));
                get(
                    user,
                    "View Order Details",
                    &endpoint::order(id),
                    StatusAllowList::OK_OR_NOT_FOUND,
                )
                .await
            }
            Self::RegisterUser => register_user(user, settings).await,
            Self::LoginUser => login_user(user, settings).await,
            Self::GetUserProfile => {
                let id = UserId::new(state(user, settings).rng.random_range(1..=100));
                get(
                    user,
                    "Get User Profile",
                    &endpoint::user(id),
                    StatusAllowList::OK_OR_NOT_FOUND,
                )
                .await
            }
            Self::MixedBrowse => mixed_browse(user, settings).await,
            Self::MixedCreateOrder => mixed_create_order(user, settings).await,
            Self::MixedUserLookup => {
                let id = UserId::new(state(user, settings).rng.random_range(1..=100));
                session::get(user, "Get User", &endpoint::user(id), Check::Default).await?;
                Ok(())
            }
            Self::QuickPurchase => quick_purchase(user, settings).await,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tasks with relative weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMix {
    tasks: Vec<(Task, usize)>,
}

impl TaskMix {
    /// Build a mix from `(task, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or a weight is zero.
    pub fn new(tasks: Vec<(Task, usize)>) -> Result<Self, TaskMixError> {
        if tasks.is_empty() {
            return Err(TaskMixError::Empty);
        }
        if let Some((task, _)) = tasks.iter().find(|(_, weight)| *weight == 0) {
            return Err(TaskMixError::ZeroWeight(*task));
        }
        Ok(Self { tasks })
    }

    /// A mix containing only `task`.
    #[must_use]
    pub fn single(task: Task) -> Self {
        Self {
            tasks: vec![(task, 1)],
        }
    }

    /// The tasks and their weights, in declaration order.
    #[must_use]
    pub fn tasks(&self) -> &[(Task, usize)] {
        &self.tasks
    }

    /// Sum of all weights: the number of transactions in one iteration.
    #[must_use]
    pub fn total_weight(&self) -> usize {
        self.tasks.iter().map(|(_, weight)| weight).sum()
    }
}

async fn get(user: &mut GooseUser, name: &str, path: &str, allowed: StatusAllowList) -> TransactionResult {
    session::get(user, name, path, Check::allow(allowed)).await?;
    Ok(())
}

/// Decode a success body, or log why the task stops here.
fn decode<T: DeserializeOwned>(reply: &Reply, what: &'static str) -> Option<T> {
    match reply.json() {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(what, error = %e, "Could not decode response, ending task");
            None
        }
    }
}

/// Create a cart for a random user and return the response.
async fn create_cart(
    user: &mut GooseUser,
    settings: &UserSettings,
) -> Result<Reply, Box<TransactionError>> {
    let body = CartRequest {
        user_id: UserId::new(state(user, settings).rng.random_range(1..=100)),
    };
    session::post_json(user, endpoint::CARTS, endpoint::CARTS, &body, Check::Default).await
}

/// Cart ID from a create-cart response, or a random one when absent.
fn cart_id_or_random(user: &mut GooseUser, settings: &UserSettings, created: CartCreated) -> CartId {
    created
        .cart_id
        .unwrap_or_else(|| CartId::new(state(user, settings).rng.random_range(1..=1000)))
}

async fn create_order(user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
    let cart = create_cart(user, settings).await?;
    if !cart.status_in(StatusAllowList::OK_OR_CREATED) {
        return Ok(());
    }
    let Some(created) = decode::<CartCreated>(&cart, "cart") else {
        return Ok(());
    };
    let cart_id = cart_id_or_random(user, settings, created);

    let rng = &mut state(user, settings).rng;
    let order = OrderRequest::new(
        format!("Stress Test Order {}", rng.random_range(1000..=9999)),
        rng.random_range(10.0..500.0),
        cart_id,
    );
    session::post_json(
        user,
        "Create Order",
        endpoint::ORDERS,
        &order,
        Check::Allow(StatusAllowList::OK_OR_CREATED, "Order creation failed:"),
    )
    .await?;
    Ok(())
}

async fn register_user(user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
    let rng = &mut state(user, settings).rng;
    let suffix = rng.random_range(10_000..=99_999);
    let phone = rng.random_range(1_000_000_000..=9_999_999_999);
    let registration = UserRegistration::load_test(suffix, phone);
    session::post_json_anonymous(
        user,
        "Register User",
        endpoint::USERS,
        &registration,
        Check::Allow(StatusAllowList::REGISTRATION, "Registration failed:"),
    )
    .await?;
    Ok(())
}

async fn login_user(user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
    session::post_json_anonymous(
        user,
        "User Login",
        endpoint::AUTHENTICATE,
        &settings.credentials(),
        Check::Allow(StatusAllowList::LOGIN, "Login failed:"),
    )
    .await?;
    Ok(())
}

async fn mixed_browse(user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
    let rng = &mut state(user, settings).rng;
    let id = ProductId::new(rng.random_range(1..=100));
    let view = rng.random_bool(0.5);
    session::get(user, "Browse Products", endpoint::PRODUCTS, Check::Default).await?;
    if view {
        session::get(user, "View Product", &endpoint::product(id), Check::Default).await?;
    }
    Ok(())
}

/// Cart ID for the mixed-workload tasks: taken from a successful response,
/// otherwise random. Only an undecodable success body ends the task.
async fn mixed_cart(
    user: &mut GooseUser,
    settings: &UserSettings,
) -> Result<Option<CartId>, Box<TransactionError>> {
    let reply = create_cart(user, settings).await?;
    if !reply.status_in(StatusAllowList::OK_OR_CREATED) {
        let random = CartId::new(state(user, settings).rng.random_range(1..=1000));
        return Ok(Some(random));
    }
    Ok(decode::<CartCreated>(&reply, "cart")
        .map(|created| cart_id_or_random(user, settings, created)))
}

async fn mixed_create_order(user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
    let Some(cart_id) = mixed_cart(user, settings).await? else {
        return Ok(());
    };
    let rng = &mut state(user, settings).rng;
    let order = OrderRequest::new(
        format!("Mixed Workload Order {}", rng.random_range(1..=9999)),
        rng.random_range(20.0..200.0),
        cart_id,
    );
    session::post_json(user, "Create Order", endpoint::ORDERS, &order, Check::Default).await?;
    Ok(())
}

async fn quick_purchase(user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
    let product = endpoint::product(ProductId::new(
        state(user, settings).rng.random_range(1..=50),
    ));
    session::get(user, &product, &product, Check::Default).await?;

    let Some(cart_id) = mixed_cart(user, settings).await? else {
        return Ok(());
    };
    let order = OrderRequest::new("Quick Purchase", 99.99, cart_id);
    let reply =
        session::post_json(user, endpoint::ORDERS, endpoint::ORDERS, &order, Check::Default)
            .await?;
    if !reply.status_in(StatusAllowList::OK_OR_CREATED) {
        return Ok(());
    }

    let Some(created) = decode::<OrderCreated>(&reply, "order") else {
        return Ok(());
    };
    let order_id = created
        .order_id
        .unwrap_or_else(|| OrderId::new(state(user, settings).rng.random_range(1..=1000)));
    session::post_json(
        user,
        endpoint::PAYMENTS,
        endpoint::PAYMENTS,
        &PaymentRequest::paid(order_id),
        Check::Default,
    )
    .await?;
    Ok(())
}

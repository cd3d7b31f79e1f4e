//! Paths of the shop API endpoints.
//!
//! All endpoints live behind the API gateway under `/app/api`.

use super::id::{OrderId, ProductId, UserId};

/// Prefix shared by every endpoint.
pub const API_PREFIX: &str = "/app/api";

/// `POST` credentials, receive a JWT.
pub const AUTHENTICATE: &str = "/app/api/authenticate";
/// `GET` the product catalog.
pub const PRODUCTS: &str = "/app/api/products";
/// `GET` product categories.
pub const CATEGORIES: &str = "/app/api/categories";
/// `GET` the caller's favourites.
pub const FAVOURITES: &str = "/app/api/favourites";
/// `POST` a new cart.
pub const CARTS: &str = "/app/api/carts";
/// `GET` all orders, `POST` a new order.
pub const ORDERS: &str = "/app/api/orders";
/// `POST` a payment for an order.
pub const PAYMENTS: &str = "/app/api/payments";
/// `POST` a shipping item (order line).
pub const SHIPPINGS: &str = "/app/api/shippings";
/// `POST` a user registration.
pub const USERS: &str = "/app/api/users";

/// Path of a single product.
#[must_use]
pub fn product(id: ProductId) -> String {
    format!("{PRODUCTS}/{id}")
}

/// Path of a single order.
#[must_use]
pub fn order(id: OrderId) -> String {
    format!("{ORDERS}/{id}")
}

/// Path of a single user profile.
#[must_use]
pub fn user(id: UserId) -> String {
    format!("{USERS}/{id}")
}

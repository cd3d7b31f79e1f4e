//! JSON request and response bodies of the shop API.
//!
//! Field names follow the service's camelCase wire format. Response types
//! only model the fields the load generator reads back; everything else in
//! the body is ignored.

use serde::{Deserialize, Serialize};

use super::id::{CartId, OrderId, PaymentId, ProductId, UserId};

/// Login credentials for `POST /authenticate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Response of a successful authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    #[serde(default)]
    pub jwt_token: Option<String>,
}

/// Body of `POST /carts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    pub user_id: UserId,
}

/// The fields read back from a created cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreated {
    #[serde(default)]
    pub cart_id: Option<CartId>,
}

/// Reference to an existing cart inside an order body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRef {
    pub cart_id: CartId,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_desc: String,
    /// Order fee in the shop currency, two decimal places.
    pub order_fee: f64,
    pub cart: CartRef,
}

impl OrderRequest {
    /// Create an order body, rounding the fee to cents.
    #[must_use]
    pub fn new(order_desc: impl Into<String>, order_fee: f64, cart_id: CartId) -> Self {
        Self {
            order_desc: order_desc.into(),
            order_fee: round_cents(order_fee),
            cart: CartRef { cart_id },
        }
    }
}

/// The fields read back from a created order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

/// Reference to an existing order inside a payment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    pub order_id: OrderId,
}

/// Body of `POST /payments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order: OrderRef,
    pub is_payed: bool,
}

impl PaymentRequest {
    /// A completed payment for `order_id`.
    #[must_use]
    pub const fn paid(order_id: OrderId) -> Self {
        Self {
            order: OrderRef { order_id },
            is_payed: true,
        }
    }
}

/// The fields read back from a created payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreated {
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
}

/// Body of `POST /shippings` (one order line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub ordered_quantity: u32,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
}

impl UserRegistration {
    /// Password used for every generated account.
    pub const LOAD_TEST_PASSWORD: &'static str = "TestPass123!";

    /// A throwaway account derived from a numeric suffix and phone number.
    #[must_use]
    pub fn load_test(suffix: u32, phone: u64) -> Self {
        Self {
            first_name: format!("LoadTest{suffix}"),
            last_name: "User".to_string(),
            email: format!("loadtest{suffix}@example.com"),
            phone: format!("+1{phone}"),
            username: format!("loadtest{suffix}"),
            password: Self::LOAD_TEST_PASSWORD.to_string(),
        }
    }
}

/// Round a monetary amount to two decimal places.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

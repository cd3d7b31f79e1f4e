//! The complete purchase journey as a sequence of dependent steps.
//!
//! Each step is a goose transaction with its own sequence number, so goose
//! runs them in order and applies the profile wait once after each step.
//! A step may store an identifier from its response for later steps. A step
//! whose prerequisite is missing is skipped, never failed. A success response
//! that is not JSON yields a random fallback ID so the journey still reaches
//! payment and shipping. An ID of `0` counts as missing.

use std::fmt;
use std::sync::Arc;

use cartstorm_core::{
    CartCreated, CartId, CartRequest, OrderCreated, OrderId, OrderRequest, PaymentCreated,
    PaymentId, PaymentRequest, ProductId, ShippingRequest, StatusAllowList, UserId, endpoint,
};
use goose::prelude::*;
use rand::Rng;
use tracing::debug;

use crate::session::{self, Check};
use crate::user::{UserSettings, state};

/// One step of the purchase journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowStep {
    BrowseProducts,
    ViewProduct,
    CreateCart,
    CreateOrder,
    ProcessPayment,
    CreateShipping,
}

impl FlowStep {
    /// Steps in execution order.
    pub const ALL: [Self; 6] = [
        Self::BrowseProducts,
        Self::ViewProduct,
        Self::CreateCart,
        Self::CreateOrder,
        Self::ProcessPayment,
        Self::CreateShipping,
    ];

    /// Statistics name of the step's request.
    #[must_use]
    pub const fn request_name(self) -> &'static str {
        match self {
            Self::BrowseProducts => "1. Browse Products",
            Self::ViewProduct => "2. View Product Details",
            Self::CreateCart => "3. Create Cart",
            Self::CreateOrder => "4. Create Order",
            Self::ProcessPayment => "5. Process Payment",
            Self::CreateShipping => "6. Create Shipping Item",
        }
    }

    /// Position of the step in the journey, starting at 1.
    #[must_use]
    pub const fn sequence(self) -> usize {
        match self {
            Self::BrowseProducts => 1,
            Self::ViewProduct => 2,
            Self::CreateCart => 3,
            Self::CreateOrder => 4,
            Self::ProcessPayment => 5,
            Self::CreateShipping => 6,
        }
    }

    /// Wrap this step in a goose transaction at its place in the sequence.
    #[must_use]
    pub fn transaction(self, settings: &Arc<UserSettings>) -> Transaction {
        let settings = Arc::clone(settings);
        let run: TransactionFunction = Arc::new(move |user| {
            let settings = Arc::clone(&settings);
            Box::pin(async move { self.run(user, &settings).await })
        });
        Transaction::new(run)
            .set_name(self.request_name())
            .set_sequence(self.sequence())
    }

    /// Run this step for `user`, reading and updating its [`PurchaseFlow`].
    ///
    /// The first step starts a new journey.
    ///
    /// # Errors
    ///
    /// Returns an error only if goose could not build or record the request.
    pub async fn run(self, user: &mut GooseUser, settings: &UserSettings) -> TransactionResult {
        if self == Self::BrowseProducts {
            state(user, settings).flow = PurchaseFlow::default();
        }
        let flow = state(user, settings).flow;
        let name = self.request_name();
        match self {
            Self::BrowseProducts => {
                let reply = session::get(user, name, endpoint::PRODUCTS, Check::Default).await?;
                if reply.status == 200 {
                    let current = state(user, settings);
                    let product_id = ProductId::new(current.rng.random_range(1..=50));
                    current.flow.product_id = Some(product_id);
                }
            }
            Self::ViewProduct => {
                let Some(product_id) = flow.product_id else {
                    return skipped(self);
                };
                session::get(user, name, &endpoint::product(product_id), Check::Default).await?;
            }
            Self::CreateCart => {
                let body = CartRequest {
                    user_id: UserId::new(state(user, settings).rng.random_range(1..=100)),
                };
                let reply =
                    session::post_json(user, name, endpoint::CARTS, &body, Check::Default).await?;
                if reply.status_in(StatusAllowList::OK_OR_CREATED) {
                    let current = state(user, settings);
                    current.flow.cart_id = match reply.json::<CartCreated>() {
                        Ok(created) => created.cart_id.filter(|id| id.as_i64() != 0),
                        Err(_) => Some(CartId::new(current.rng.random_range(1..=1000))),
                    };
                }
            }
            Self::CreateOrder => {
                let rng = &mut state(user, settings).rng;
                let cart_id = flow
                    .cart_id
                    .unwrap_or_else(|| CartId::new(rng.random_range(1..=1000)));
                let order = OrderRequest::new(
                    "Complete Flow Test Order",
                    rng.random_range(50.0..300.0),
                    cart_id,
                );
                let reply =
                    session::post_json(user, name, endpoint::ORDERS, &order, Check::Default)
                        .await?;
                if reply.status_in(StatusAllowList::OK_OR_CREATED) {
                    let current = state(user, settings);
                    current.flow.order_id = match reply.json::<OrderCreated>() {
                        Ok(created) => created.order_id.filter(|id| id.as_i64() != 0),
                        Err(_) => Some(OrderId::new(current.rng.random_range(1..=10_000))),
                    };
                }
            }
            Self::ProcessPayment => {
                let Some(order_id) = flow.order_id else {
                    return skipped(self);
                };
                let reply = session::post_json(
                    user,
                    name,
                    endpoint::PAYMENTS,
                    &PaymentRequest::paid(order_id),
                    Check::Default,
                )
                .await?;
                if reply.status_in(StatusAllowList::OK_OR_CREATED) {
                    let current = state(user, settings);
                    current.flow.payment_id = match reply.json::<PaymentCreated>() {
                        Ok(created) => created.payment_id.filter(|id| id.as_i64() != 0),
                        Err(_) => Some(PaymentId::new(current.rng.random_range(1..=10_000))),
                    };
                }
            }
            Self::CreateShipping => {
                let (Some(order_id), Some(product_id)) = (flow.order_id, flow.product_id) else {
                    return skipped(self);
                };
                let shipping = ShippingRequest {
                    order_id,
                    product_id,
                    ordered_quantity: state(user, settings).rng.random_range(1..=5),
                };
                session::post_json(user, name, endpoint::SHIPPINGS, &shipping, Check::Default)
                    .await?;
            }
        }
        Ok(())
    }
}

fn skipped(step: FlowStep) -> TransactionResult {
    debug!(step = %step, "Purchase flow step skipped, prerequisite missing");
    Ok(())
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.request_name())
    }
}

/// Identifiers collected during one pass of the journey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurchaseFlow {
    pub product_id: Option<ProductId>,
    pub cart_id: Option<CartId>,
    pub order_id: Option<OrderId>,
    pub payment_id: Option<PaymentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_numbered_in_order() {
        for (i, step) in FlowStep::ALL.iter().enumerate() {
            let prefix = format!("{}. ", i + 1);
            assert!(step.request_name().starts_with(&prefix), "{step}");
            assert_eq!(step.sequence(), i + 1);
        }
    }

    #[test]
    fn test_fresh_flow_has_no_ids() {
        let flow = PurchaseFlow::default();
        assert_eq!(flow.product_id, None);
        assert_eq!(flow.cart_id, None);
        assert_eq!(flow.order_id, None);
        assert_eq!(flow.payment_id, None);
    }
}

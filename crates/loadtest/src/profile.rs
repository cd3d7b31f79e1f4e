//! User profiles: what a simulated user does and how long it thinks.
//!
//! # Built-in profiles
//!
//! | Profile | Wait | Tasks (weight) |
//! |---------|------|----------------|
//! | `product-browsing` | 1-3s | browse products (5), product details (3), categories (2), favourites (1) |
//! | `order-stress` | 0.5-2s | create order (4), browse orders (2), order details (1) |
//! | `user-auth` | 2-5s | register (3), login (5), user profile (2) |
//! | `purchase-flow` | 3-10s | the sequential purchase journey |
//! | `mixed-workload` | 1-5s | browse (12), create order (4), user lookup (3), quick purchase (1) |

use std::sync::Arc;

use goose::prelude::*;
use thiserror::Error;

use crate::auth;
use crate::flow::FlowStep;
use crate::task::{Task, TaskMix, TaskMixError};
use crate::user::UserSettings;
use crate::wait::{WaitTime, WaitTimeError};

/// Errors building or selecting profiles.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("unknown profile '{0}' (see `cartstorm profiles`)")]
    Unknown(String),
    #[error("no profiles selected")]
    NoneSelected,
    #[error("profile {name} has weight 0")]
    ZeroWeight { name: String },
    #[error("profile {name}: {source}")]
    Tasks {
        name: String,
        #[source]
        source: TaskMixError,
    },
    #[error("profile {name}: {source}")]
    Wait {
        name: String,
        #[source]
        source: WaitTimeError,
    },
}

/// What a user of a profile does in one scenario iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routine {
    /// Every task of the mix, each as many times as its weight.
    Weighted(TaskMix),
    /// The six purchase steps, in order.
    PurchaseFlow,
}

impl Routine {
    /// Number of transactions in one iteration.
    #[must_use]
    pub fn transactions(&self) -> usize {
        match self {
            Self::Weighted(mix) => mix.total_weight(),
            Self::PurchaseFlow => FlowStep::ALL.len(),
        }
    }
}

impl From<TaskMix> for Routine {
    fn from(mix: TaskMix) -> Self {
        Self::Weighted(mix)
    }
}

/// Named user behaviour, run by goose as one scenario.
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    description: String,
    weight: usize,
    wait: WaitTime,
    routine: Routine,
    authenticate: bool,
}

impl Profile {
    /// Create a profile that authenticates on start and has weight 1.
    #[must_use]
    pub fn new(name: impl Into<String>, wait: WaitTime, routine: impl Into<Routine>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            weight: 1,
            wait,
            routine: routine.into(),
            authenticate: true,
        }
    }

    /// Set the one-line description shown in listings.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the relative share of users running this profile.
    ///
    /// # Errors
    ///
    /// Returns an error if `weight` is zero.
    pub fn with_weight(mut self, weight: usize) -> Result<Self, ProfileError> {
        if weight == 0 {
            return Err(ProfileError::ZeroWeight { name: self.name });
        }
        self.weight = weight;
        Ok(self)
    }

    /// Replace the wait time.
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitTime) -> Self {
        self.wait = wait;
        self
    }

    /// Skip the start-up login.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.authenticate = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn weight(&self) -> usize {
        self.weight
    }

    #[must_use]
    pub const fn wait(&self) -> WaitTime {
        self.wait
    }

    #[must_use]
    pub const fn routine(&self) -> &Routine {
        &self.routine
    }

    /// Whether users of this profile log in before their first task.
    #[must_use]
    pub const fn authenticates(&self) -> bool {
        self.authenticate
    }

    /// The goose scenario running this profile.
    ///
    /// Goose splits users across scenarios by weight and pauses for the
    /// profile wait after every transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if goose rejects a weight or the wait bounds.
    pub fn scenario(&self, settings: &Arc<UserSettings>) -> Result<Scenario, GooseError> {
        let mut scenario = self
            .wait
            .apply(Scenario::new(&self.name).set_weight(self.weight)?)?;
        if self.authenticate {
            scenario = scenario.register_transaction(auth::on_start(settings));
        }
        match &self.routine {
            Routine::Weighted(mix) => {
                for (task, weight) in mix.tasks() {
                    let transaction = task.transaction(settings).set_weight(*weight)?;
                    scenario = scenario.register_transaction(transaction);
                }
            }
            Routine::PurchaseFlow => {
                for step in FlowStep::ALL {
                    scenario = scenario.register_transaction(step.transaction(settings));
                }
            }
        }
        Ok(scenario)
    }
}

fn build(
    name: &str,
    description: &str,
    wait: (f64, f64),
    routine: Routine,
) -> Result<Profile, ProfileError> {
    let wait = WaitTime::between(wait.0, wait.1).map_err(|source| ProfileError::Wait {
        name: name.to_string(),
        source,
    })?;
    Ok(Profile::new(name, wait, routine).with_description(description))
}

fn mix(name: &str, tasks: Vec<(Task, usize)>) -> Result<Routine, ProfileError> {
    TaskMix::new(tasks)
        .map(Routine::Weighted)
        .map_err(|source| ProfileError::Tasks {
            name: name.to_string(),
            source,
        })
}

/// Catalog browsing.
///
/// # Errors
///
/// Never fails for the built-in table; the `Result` covers validation.
pub fn product_browsing() -> Result<Profile, ProfileError> {
    build(
        "product-browsing",
        "Users browsing the product catalog",
        (1.0, 3.0),
        mix(
            "product-browsing",
            vec![
                (Task::BrowseProducts, 5),
                (Task::ViewProductDetails, 3),
                (Task::BrowseCategories, 2),
                (Task::ViewFavourites, 1),
            ],
        )?,
    )
}

/// Flash-sale order creation.
///
/// # Errors
///
/// Never fails for the built-in table; the `Result` covers validation.
pub fn order_stress() -> Result<Profile, ProfileError> {
    build(
        "order-stress",
        "High order creation load (flash sale)",
        (0.5, 2.0),
        mix(
            "order-stress",
            vec![
                (Task::CreateOrder, 4),
                (Task::BrowseOrders, 2),
                (Task::ViewOrderDetails, 1),
            ],
        )?,
    )
}

/// Registration and login.
///
/// # Errors
///
/// Never fails for the built-in table; the `Result` covers validation.
pub fn user_auth() -> Result<Profile, ProfileError> {
    build(
        "user-auth",
        "User registration, login and profile lookups",
        (2.0, 5.0),
        mix(
            "user-auth",
            vec![
                (Task::RegisterUser, 3),
                (Task::LoginUser, 5),
                (Task::GetUserProfile, 2),
            ],
        )?,
    )
}

/// The sequential browse-to-shipping journey.
///
/// # Errors
///
/// Never fails for the built-in table; the `Result` covers validation.
pub fn purchase_flow() -> Result<Profile, ProfileError> {
    build(
        "purchase-flow",
        "Complete purchase: browse, cart, order, payment, shipping",
        (3.0, 10.0),
        Routine::PurchaseFlow,
    )
}

/// Realistic mix: 60% browsing, 20% orders, 15% user lookups, 5% purchases.
///
/// # Errors
///
/// Never fails for the built-in table; the `Result` covers validation.
pub fn mixed_workload() -> Result<Profile, ProfileError> {
    build(
        "mixed-workload",
        "Mixed workload: 60% browse, 20% order, 15% user, 5% purchase",
        (1.0, 5.0),
        mix(
            "mixed-workload",
            vec![
                (Task::MixedBrowse, 12),
                (Task::MixedCreateOrder, 4),
                (Task::MixedUserLookup, 3),
                (Task::QuickPurchase, 1),
            ],
        )?,
    )
}

/// Names of the built-in profiles.
pub const BUILT_IN: [&str; 5] = [
    "product-browsing",
    "order-stress",
    "user-auth",
    "purchase-flow",
    "mixed-workload",
];

/// Look up a built-in profile by name.
///
/// # Errors
///
/// Returns `ProfileError::Unknown` if no built-in profile has that name.
pub fn by_name(name: &str) -> Result<Profile, ProfileError> {
    match name {
        "product-browsing" => product_browsing(),
        "order-stress" => order_stress(),
        "user-auth" => user_auth(),
        "purchase-flow" => purchase_flow(),
        "mixed-workload" => mixed_workload(),
        other => Err(ProfileError::Unknown(other.to_string())),
    }
}

/// All built-in profiles.
///
/// # Errors
///
/// Never fails for the built-in tables; the `Result` covers validation.
pub fn all() -> Result<Vec<Profile>, ProfileError> {
    BUILT_IN.iter().map(|name| by_name(name)).collect()
}

/// Resolve profile names, or every built-in profile when `names` is empty.
///
/// # Errors
///
/// Returns `ProfileError::Unknown` for the first unknown name.
pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Vec<Profile>, ProfileError> {
    if names.is_empty() {
        return all();
    }
    names.iter().map(|name| by_name(name.as_ref())).collect()
}

/// Sleep-free variant of a profile for tests and smoke runs.
#[must_use]
pub fn without_wait(profile: Profile) -> Profile {
    profile.with_wait(WaitTime::none())
}

//! State of one simulated user.
//!
//! Goose owns the user loop; what a user remembers between transactions (its
//! bearer token, its random source and the purchase journey in progress)
//! lives in the goose session slot as a [`UserState`].

use cartstorm_core::Credentials;
use goose::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use secrecy::{ExposeSecret, SecretString};

use crate::config::LoadTestConfig;
use crate::flow::PurchaseFlow;

/// Settings shared by every simulated user of a run.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct UserSettings {
    /// Username of the shared test account
    pub username: String,
    /// Password of the shared test account
    pub password: SecretString,
    /// Base seed for per-user random sources
    pub seed: Option<u64>,
}

impl std::fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSettings")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("seed", &self.seed)
            .finish()
    }
}

impl UserSettings {
    /// Login body for the shared test account.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.expose_secret().to_string(),
        }
    }
}

impl From<&LoadTestConfig> for UserSettings {
    fn from(config: &LoadTestConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            seed: config.seed,
        }
    }
}

/// What a simulated user carries from one transaction to the next.
pub struct UserState {
    /// Random source for IDs, payloads and branch choices.
    pub rng: StdRng,
    /// The purchase journey in progress.
    pub flow: PurchaseFlow,
    token: Option<SecretString>,
}

impl UserState {
    /// Fresh state for the user at `index`. With a seed, user `n` draws from
    /// `seed + n` so runs are reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>, index: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            flow: PurchaseFlow::default(),
            token: None,
        }
    }

    /// The bearer token, once logged in.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: Option<SecretString>) {
        self.token = token;
    }
}

/// The state of `user`, created on first use.
pub fn state<'a>(user: &'a mut GooseUser, settings: &UserSettings) -> &'a mut UserState {
    if user.get_session_data::<UserState>().is_none() {
        let fresh = UserState::new(settings.seed, user.weighted_users_index);
        user.set_session_data(fresh);
    }
    user.get_session_data_unchecked_mut::<UserState>()
}

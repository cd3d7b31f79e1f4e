//! JWT authentication against the shop API.

use std::sync::Arc;

use cartstorm_core::{AuthResponse, endpoint};
use goose::prelude::*;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::session::{self, Access};
use crate::user::{UserSettings, state};

/// Statistics name of the start-up login.
pub const AUTHENTICATE: &str = "Authenticate";

/// Log in with the shared account and store the bearer token.
///
/// The request counts as a success only if the service answers `200` with a
/// non-empty `jwtToken`. On any failure the user is left anonymous and
/// carries on without an `Authorization` header.
///
/// Returns whether a token was obtained.
///
/// # Errors
///
/// Returns an error only if goose could not build or record the request.
pub async fn authenticate(
    user: &mut GooseUser,
    settings: &UserSettings,
) -> Result<bool, Box<TransactionError>> {
    let credentials = settings.credentials();
    let reply = session::send(
        user,
        GooseMethod::Post,
        AUTHENTICATE,
        endpoint::AUTHENTICATE,
        Some(&credentials),
        Access::Anonymous,
        |status, body| judge_auth_response(status, body).map(|_| ()),
    )
    .await?;

    let token = judge_auth_response(reply.status, &reply.body).ok();
    let authenticated = token.is_some();
    if authenticated {
        debug!(username = %settings.username, "Authenticated");
    } else {
        warn!(
            username = %settings.username,
            status = reply.status,
            "Authentication failed, continuing without token"
        );
    }
    state(user, settings).set_token(token.map(SecretString::from));
    Ok(authenticated)
}

/// The start-up login, run once per user before any other transaction.
#[must_use]
pub fn on_start(settings: &Arc<UserSettings>) -> Transaction {
    let settings = Arc::clone(settings);
    let login: TransactionFunction = Arc::new(move |user| {
        let settings = Arc::clone(&settings);
        Box::pin(async move {
            authenticate(user, &settings).await?;
            Ok(())
        })
    });
    Transaction::new(login).set_name(AUTHENTICATE).set_on_start()
}

/// Extract the token from an authentication response, or explain why not.
fn judge_auth_response(status: u16, body: &str) -> Result<String, String> {
    if status != 200 {
        return Err(format!("Authentication failed with status {status}"));
    }
    match serde_json::from_str::<AuthResponse>(body) {
        Ok(AuthResponse {
            jwt_token: Some(token),
        }) if !token.is_empty() => Ok(token),
        Ok(_) => Err("No JWT token in response".to_string()),
        Err(e) => Err(format!("Failed to parse auth response: {e}")),
    }
}

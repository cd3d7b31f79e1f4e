//! Requests issued on behalf of one simulated user.
//!
//! Goose times every request and counts it under its name. On top of that
//! these helpers attach the user's bearer token, read the body back, and
//! re-judge the status against the request's own [`Check`], so a `404` on a
//! random product lookup can count as a success while an unexpected `202`
//! counts as a failure.

use cartstorm_core::StatusAllowList;
use goose::goose::TransactionError;
use goose::prelude::*;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::user::UserState;

/// Failure prefix of allow-lists without a more specific message.
pub const STATUS_FAILURE: &str = "Got status code";

/// How a response status is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Any status below 400 is a success.
    Default,
    /// Only the listed statuses are a success; rejections are reported as
    /// `"<prefix> <status>"`.
    Allow(StatusAllowList, &'static str),
}

impl Check {
    /// Allow-list with the generic `Got status code N` failure message.
    #[must_use]
    pub const fn allow(allowed: StatusAllowList) -> Self {
        Self::Allow(allowed, STATUS_FAILURE)
    }

    /// Judge a status code, returning the failure message on rejection.
    ///
    /// # Errors
    ///
    /// Returns the failure message if the status is not acceptable.
    pub fn judge(&self, status: u16) -> Result<(), String> {
        match self {
            Self::Default if status < 400 => Ok(()),
            Self::Default => Err(format!("HTTP {status}")),
            Self::Allow(allowed, _) if allowed.accepts(status) => Ok(()),
            Self::Allow(_, prefix) => Err(format!("{prefix} {status}")),
        }
    }
}

/// Whether a request carries the user's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Send `Authorization: Bearer` once the user has logged in.
    Bearer,
    /// Never send the token (registration and login).
    Anonymous,
}

/// A received response.
///
/// A request that never got a response (refused connection, timeout) has
/// status `0` and an empty body; goose has already counted it as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl Reply {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Returns true if the status is one of `allowed`.
    #[must_use]
    pub fn status_in(&self, allowed: StatusAllowList) -> bool {
        allowed.accepts(self.status)
    }
}

/// Issue a `GET` request with the user's token.
///
/// # Errors
///
/// Returns an error only if goose could not build or record the request.
pub async fn get(
    user: &mut GooseUser,
    name: &str,
    path: &str,
    check: Check,
) -> Result<Reply, Box<TransactionError>> {
    send::<()>(user, GooseMethod::Get, name, path, None, Access::Bearer, |status, _| {
        check.judge(status)
    })
    .await
}

/// Issue a `POST` request with a JSON body and the user's token.
///
/// # Errors
///
/// Returns an error only if goose could not build or record the request.
pub async fn post_json<B: Serialize + ?Sized>(
    user: &mut GooseUser,
    name: &str,
    path: &str,
    body: &B,
    check: Check,
) -> Result<Reply, Box<TransactionError>> {
    send(user, GooseMethod::Post, name, path, Some(body), Access::Bearer, |status, _| {
        check.judge(status)
    })
    .await
}

/// Issue a `POST` request with a JSON body and no `Authorization` header.
///
/// # Errors
///
/// Returns an error only if goose could not build or record the request.
pub async fn post_json_anonymous<B: Serialize + ?Sized>(
    user: &mut GooseUser,
    name: &str,
    path: &str,
    body: &B,
    check: Check,
) -> Result<Reply, Box<TransactionError>> {
    send(user, GooseMethod::Post, name, path, Some(body), Access::Anonymous, |status, _| {
        check.judge(status)
    })
    .await
}

/// Issue a request and judge the response with a custom function.
///
/// `judge` receives the status and the body and returns the failure message
/// when the response should count as a failure. Goose's own verdict is
/// overridden in both directions.
///
/// # Errors
///
/// Returns an error only if goose could not build or record the request.
#[instrument(skip(user, body, judge), level = "debug")]
pub async fn send<B: Serialize + ?Sized>(
    user: &mut GooseUser,
    method: GooseMethod,
    name: &str,
    path: &str,
    body: Option<&B>,
    access: Access,
    judge: impl FnOnce(u16, &str) -> Result<(), String> + Send,
) -> Result<Reply, Box<TransactionError>> {
    let token = match access {
        Access::Bearer => user
            .get_session_data::<UserState>()
            .and_then(UserState::token)
            .cloned(),
        Access::Anonymous => None,
    };

    let mut builder = user.get_request_builder(&method, path)?;
    if let Some(token) = token {
        builder = builder.bearer_auth(token.expose_secret());
    }
    if let Some(body) = body {
        builder = builder.json(body);
    }
    let request = GooseRequest::builder()
        .method(method)
        .path(path)
        .name(name)
        .set_request_builder(builder)
        .build();
    let mut goose = user.request(request).await?;

    let response = match goose.response {
        Ok(response) => response,
        Err(e) => {
            debug!(name, error = %e, "Request did not complete");
            return Ok(Reply {
                status: 0,
                body: String::new(),
            });
        }
    };
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    match judge(status, &body) {
        Ok(()) if !goose.request.success => user.set_success(&mut goose.request)?,
        Ok(()) => {}
        Err(message) => {
            debug!(status, name, failure = %message, "Request failed check");
            // `set_failure` always answers `RequestFailed`; the task goes on.
            match user.set_failure(&message, &mut goose.request, None, Some(body.as_str())) {
                Err(e) if matches!(*e, TransactionError::RequestFailed { .. }) => {}
                other => other?,
            }
        }
    }

    Ok(Reply { status, body })
}

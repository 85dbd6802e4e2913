// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Authenticated client for the WHOOP mobile API.
//!
//! WHOOP has no public API for this data; the mobile app authenticates
//! against an AWS Cognito user pool fronted by the vendor's gateway and
//! reads daily reports from a handful of read-only endpoints. This module
//! implements that flow: credential login, token expiry tracking with a
//! five-minute safety margin, and a uniform authenticated GET path that
//! re-authenticates once on a 401 before giving up.
//!
//! Vendor payloads are passed through as opaque [`serde_json::Value`]s;
//! WHOOP publishes no schema for these endpoints and this layer does not
//! invent one.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Duration as TokenDuration, Local, Utc};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::whoop_api;
use crate::logging::AppLogger;

/// Errors produced by the WHOOP client.
///
/// Callers can branch on the kind without string matching; the tool layer
/// above turns these into user-visible messages.
#[derive(Debug, thiserror::Error)]
pub enum WhoopError {
    /// Credentials were missing or empty at authentication time. Fatal to
    /// the call; no network request is issued.
    #[error("WHOOP credentials missing: {0}")]
    Credentials(&'static str),

    /// The identity provider rejected the login or returned an unexpected
    /// shape. Carries the provider's status code and body for diagnostics.
    #[error("WHOOP authentication failed{}: {body}", fmt_status(.status))]
    Authentication { status: Option<u16>, body: String },

    /// A data endpoint returned a non-2xx after the one permitted retry, the
    /// transport failed (status is `None`), or a 2xx body was not JSON.
    #[error("WHOOP API request failed{}: {body}", fmt_status(.status))]
    ApiRequest { status: Option<u16>, body: String },
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

fn transport_detail(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    }
}

/// In-memory login state. Replaced wholesale on every re-authentication;
/// never persisted. `access_token` being present implies `expires_at` is
/// present.
#[derive(Debug, Clone, Default)]
struct Session {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    /// Informational only; populated best-effort after login
    #[allow(dead_code)]
    user_id: Option<i64>,
}

impl Session {
    /// A session is fresh while it holds a token that is still at least the
    /// safety margin away from its recorded expiry.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => {
                now < expires_at - TokenDuration::seconds(whoop_api::TOKEN_EXPIRY_MARGIN_SECS)
            }
            _ => false,
        }
    }
}

/// Client for the WHOOP mobile API.
///
/// One instance is constructed at process start and shared across
/// concurrent tool calls. The session sits behind a [`Mutex`] so at most
/// one login is in flight at a time; callers waiting on the lock observe
/// the refreshed session instead of issuing redundant logins. Dropping the
/// client releases the underlying connection pool.
pub struct WhoopClient {
    client: Client,
    base_url: String,
    email: String,
    password: String,
    session: Mutex<Session>,
}

impl WhoopClient {
    /// Create a client against the production WHOOP API.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_base_url(whoop_api::BASE_URL, email, password)
    }

    /// Create a client against an alternate base URL. Used by tests to point
    /// the client at a mock server; deployments use [`WhoopClient::new`].
    pub fn with_base_url(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(whoop_api::REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            password: password.into(),
            session: Mutex::new(Session::default()),
        })
    }

    /// Log in against the vendor's identity provider and replace the session.
    ///
    /// Fails with [`WhoopError::Credentials`] before any network call when
    /// either credential is empty. No retry happens here; retry policy
    /// belongs to the caller.
    pub async fn authenticate(&self) -> Result<(), WhoopError> {
        let mut session = self.session.lock().await;
        self.authenticate_session(&mut session).await.map(|_| ())
    }

    /// Login exchange, writing the new session through `session`. Returns
    /// the fresh access token. Callers must hold the session lock.
    async fn authenticate_session(&self, session: &mut Session) -> Result<String, WhoopError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(WhoopError::Credentials(
                "WHOOP_EMAIL and WHOOP_PASSWORD must be set",
            ));
        }

        let url = format!("{}{}", self.base_url, whoop_api::AUTH_ENDPOINT);
        let payload = json!({
            "AuthParameters": {
                "USERNAME": self.email,
                "PASSWORD": self.password,
            },
            // WHOOP's Cognito pool accepts (and requires) an empty client id
            "ClientId": "",
            "AuthFlow": whoop_api::AUTH_FLOW,
        });

        let response = self
            .client
            .post(&url)
            .header("Host", whoop_api::API_HOST)
            .header("Accept", "*/*")
            .header("Content-Type", whoop_api::COGNITO_CONTENT_TYPE)
            .header("X-Amz-Target", whoop_api::COGNITO_TARGET)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| WhoopError::Authentication {
                status: None,
                body: transport_detail(&e),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WhoopError::Authentication {
                status: Some(status.as_u16()),
                body: transport_detail(&e),
            })?;

        if !status.is_success() {
            AppLogger::log_auth_event("cognito_login", false, Some(&status.to_string()));
            return Err(WhoopError::Authentication {
                status: Some(status.as_u16()),
                body,
            });
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| WhoopError::Authentication {
            status: Some(status.as_u16()),
            body: format!("login response is not valid JSON: {e}"),
        })?;

        let access_token = data["AuthenticationResult"]["AccessToken"]
            .as_str()
            .ok_or_else(|| WhoopError::Authentication {
                status: Some(status.as_u16()),
                body: "login failed: no authentication result received".to_string(),
            })?
            .to_string();

        let expires_in = data["AuthenticationResult"]["ExpiresIn"]
            .as_i64()
            .unwrap_or(whoop_api::DEFAULT_TOKEN_LIFETIME_SECS);

        // Token and expiry land together; there is no intermediate state
        // with one updated and not the other.
        *session = Session {
            access_token: Some(access_token.clone()),
            expires_at: Some(Utc::now() + TokenDuration::seconds(expires_in)),
            user_id: None,
        };

        AppLogger::log_auth_event("cognito_login", true, None);
        info!("Authenticated with the WHOOP API via AWS Cognito");

        // Informational only; nothing on the data path depends on it.
        match self.fetch_user_id(&access_token).await {
            Ok(user_id) => session.user_id = user_id,
            Err(e) => warn!("Could not fetch WHOOP user id: {}", e),
        }

        Ok(access_token)
    }

    async fn fetch_user_id(&self, token: &str) -> Result<Option<i64>, WhoopError> {
        let url = format!("{}{}", self.base_url, whoop_api::PROFILE_ENDPOINT);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| WhoopError::ApiRequest {
                status: None,
                body: transport_detail(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WhoopError::ApiRequest {
                status: Some(status.as_u16()),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let profile: Value = response.json().await.map_err(|e| WhoopError::ApiRequest {
            status: Some(status.as_u16()),
            body: transport_detail(&e),
        })?;

        Ok(profile["user_id"].as_i64())
    }

    /// Single gate every data fetch passes through. Returns a token that is
    /// either freshly obtained or still at least five minutes from expiry.
    async fn ensure_authenticated(&self) -> Result<String, WhoopError> {
        let mut session = self.session.lock().await;
        if session.is_fresh(Utc::now()) {
            match session.access_token.as_deref() {
                Some(token) => Ok(token.to_string()),
                // Unreachable while the session invariant holds
                None => Err(WhoopError::Authentication {
                    status: None,
                    body: "session lost its access token".to_string(),
                }),
            }
        } else {
            self.authenticate_session(&mut session).await
        }
    }

    /// Re-authenticate unconditionally, bypassing the expiry check. Used
    /// after a server-reported 401.
    async fn force_reauthenticate(&self) -> Result<String, WhoopError> {
        let mut session = self.session.lock().await;
        self.authenticate_session(&mut session).await
    }

    /// Issue an authenticated GET and parse the JSON response.
    ///
    /// On a 401 the client re-authenticates exactly once and retries the
    /// same GET exactly once; a second 401 is a hard failure, never a loop.
    pub async fn authenticated_get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, WhoopError> {
        let token = self.ensure_authenticated().await?;
        let started = std::time::Instant::now();
        let mut response = self.send_get(endpoint, params, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("WHOOP rejected the access token, re-authenticating once");
            let token = self.force_reauthenticate().await?;
            response = self.send_get(endpoint, params, &token).await?;
        }

        let status = response.status();
        AppLogger::log_whoop_request(endpoint, status.as_u16(), started.elapsed().as_millis() as u64);

        let body = response.text().await.map_err(|e| WhoopError::ApiRequest {
            status: Some(status.as_u16()),
            body: transport_detail(&e),
        })?;

        if !status.is_success() {
            return Err(WhoopError::ApiRequest {
                status: Some(status.as_u16()),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| WhoopError::ApiRequest {
            status: Some(status.as_u16()),
            body: format!("response body is not valid JSON: {e}"),
        })
    }

    async fn send_get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        token: &str,
    ) -> Result<Response, WhoopError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} {:?}", endpoint, params);

        self.client
            .get(&url)
            .query(params)
            .header("Host", whoop_api::API_HOST)
            .bearer_auth(token)
            .header("Accept", "*/*")
            .header("User-Agent", whoop_api::DEVICE_PLATFORM)
            .header("Content-Type", "application/json")
            .header("X-WHOOP-Device-Platform", whoop_api::DEVICE_PLATFORM)
            .header("X-WHOOP-Time-Zone", local_time_zone())
            .header("Locale", whoop_api::LOCALE)
            .header("Currency", whoop_api::CURRENCY)
            .send()
            .await
            .map_err(|e| WhoopError::ApiRequest {
                status: None,
                body: transport_detail(&e),
            })
    }

    /// Daily overview from the home aggregate endpoint.
    ///
    /// `date` is `YYYY-MM-DD` and defaults to today. The client does not
    /// validate the format; a malformed date surfaces as the vendor's own
    /// rejection.
    pub async fn get_overview(&self, date: Option<&str>) -> Result<Value, WhoopError> {
        self.fetch_daily(whoop_api::OVERVIEW_ENDPOINT, date).await
    }

    /// Detailed sleep analysis for a date.
    pub async fn get_sleep(&self, date: Option<&str>) -> Result<Value, WhoopError> {
        self.fetch_daily(whoop_api::SLEEP_ENDPOINT, date).await
    }

    /// Recovery deep dive for a date.
    pub async fn get_recovery(&self, date: Option<&str>) -> Result<Value, WhoopError> {
        self.fetch_daily(whoop_api::RECOVERY_ENDPOINT, date).await
    }

    /// Strain deep dive for a date.
    pub async fn get_strain(&self, date: Option<&str>) -> Result<Value, WhoopError> {
        self.fetch_daily(whoop_api::STRAIN_ENDPOINT, date).await
    }

    /// Healthspan (biological age / pace of aging) report for a date.
    pub async fn get_healthspan(&self, date: Option<&str>) -> Result<Value, WhoopError> {
        self.fetch_daily(whoop_api::HEALTHSPAN_ENDPOINT, date).await
    }

    async fn fetch_daily(&self, endpoint: &str, date: Option<&str>) -> Result<Value, WhoopError> {
        let date = date.map(str::to_string).unwrap_or_else(current_date);
        self.authenticated_get(endpoint, &[("date", date.as_str())])
            .await
    }

    /// Tear down the client and its connection pool. Consumes the client,
    /// so no further requests can be issued through it.
    pub fn close(self) {}
}

/// Today's date in the process-local zone, `YYYY-MM-DD`.
fn current_date() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Local IANA/OS time zone for the `X-WHOOP-Time-Zone` header, "UTC" when
/// the platform cannot report one.
fn local_time_zone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

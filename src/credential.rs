//! Bearer credential with lock-guarded refresh.
//!
//! A [`Credential`] owns one [`TokenRecord`] behind an async mutex. The lock spans the record
//! and the whole refresh round trip, so concurrent callers that all find the token expiring
//! queue behind the first one and then reuse its result instead of refreshing again.
//!
//! Refresh outcomes:
//!
//! - Success updates the access token and expiry, replaces the refresh token only when the
//!   response carries one, then notifies listeners.
//! - A 4xx structured error clears the access token and expiry (the refresh token stays),
//!   notifies listeners, and returns the error.
//! - A 4xx without a structured body notifies listeners and returns the error.
//! - A 5xx answer or a transport failure leaves the record untouched, notifies listeners, and
//!   reports `false`.

pub mod listener;
pub mod metrics;

pub use listener::*;
pub use metrics::*;

// std
use std::sync::LazyLock;
// crates.io
use oauth2::http::header::WWW_AUTHENTICATE;
use regex::Regex;
// self
use crate::{
	_prelude::*,
	access::AccessMethod,
	auth::{TokenRecord, TokenSecret, token::record::epoch_millis},
	clock::{Clock, SystemClock},
	error::ConfigError,
	exchange::{TokenExchange, TokenGrant, TokenRequest, TokenResponse},
	http::{HttpRequest, HttpResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Remaining lifetime at or below which a token is refreshed before use.
pub const REFRESH_WINDOW: Duration = Duration::seconds(60);

const BEARER_PREFIX: &str = "Bearer ";

static INVALID_TOKEN_ERROR: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r#"error\s*=\s*"?invalid_token"?"#).ok());

/// Thread-safe OAuth 2.0 bearer credential.
pub struct Credential {
	state: AsyncMutex<TokenRecord>,
	access_method: Arc<dyn AccessMethod>,
	clock: Arc<dyn Clock>,
	token_server: Option<TokenExchange>,
	listeners: Vec<Arc<dyn RefreshListener>>,
	metrics: RefreshMetrics,
}
impl Credential {
	/// Starts a builder; `access_method` decides how the token rides on requests.
	pub fn builder(access_method: Arc<dyn AccessMethod>) -> CredentialBuilder {
		CredentialBuilder::new(access_method)
	}

	/// Attaches the access token to `request`, refreshing first when it is missing or expires
	/// within [`REFRESH_WINDOW`].
	///
	/// When no token is available after that, the request is left untouched. Transient refresh
	/// failures are not reported; a definitive 4xx from the token endpoint is.
	pub async fn intercept(&self, request: &mut HttpRequest) -> Result<()> {
		let mut state = self.state.lock().await;

		if self.needs_refresh(&state) {
			self.refresh_locked(&mut state).await?;
		}

		match &state.access_token {
			Some(token) => self.access_method.attach(request, token.expose()),
			None => {
				obs::obs_debug!("No access token available; request sent unauthenticated.");

				Ok(())
			},
		}
	}

	/// Decides whether a rejected request should be retried, refreshing when needed.
	///
	/// The first `WWW-Authenticate` value using the Bearer scheme decides: only an
	/// `invalid_token` error triggers a refresh. Without a Bearer challenge, a 401 does.
	/// Returns `true` when the caller should retry, which includes the case where another
	/// task already replaced the token the failed request carried.
	pub async fn handle_unauthorized_response(
		&self,
		request: &HttpRequest,
		response: &HttpResponse,
	) -> Result<bool> {
		let span = FlowSpan::new(FlowKind::UnauthorizedResponse, "handle_unauthorized_response");

		span.instrument(async move {
			if !should_refresh_after(response) {
				obs::obs_debug!("Rejection does not call for a token refresh.");

				return Ok(false);
			}

			let mut state = self.state.lock().await;
			let sent = self.access_method.extract(request);

			if sent.as_deref() != state.access_token.as_ref().map(TokenSecret::expose) {
				obs::obs_debug!("Token already replaced since the request was sent.");

				return Ok(true);
			}

			self.refresh_locked(&mut state).await
		})
		.await
	}

	/// Redeems the refresh token. Returns `false` when there is none or the failure was transient.
	pub async fn refresh(&self) -> Result<bool> {
		let mut state = self.state.lock().await;

		self.refresh_locked(&mut state).await
	}

	/// Current access token.
	pub async fn access_token(&self) -> Option<TokenSecret> {
		self.state.lock().await.access_token.clone()
	}

	/// Current refresh token.
	pub async fn refresh_token(&self) -> Option<TokenSecret> {
		self.state.lock().await.refresh_token.clone()
	}

	/// Absolute expiry of the access token, if known.
	pub async fn expires_at(&self) -> Option<OffsetDateTime> {
		self.state.lock().await.expires_at()
	}

	/// Remaining lifetime of the access token by the injected clock; negative once expired.
	pub async fn expires_in(&self) -> Option<Duration> {
		self.state.lock().await.remaining(self.clock.now())
	}

	/// Copy of the current record.
	pub async fn snapshot(&self) -> TokenRecord {
		self.state.lock().await.clone()
	}

	/// Replaces the access token.
	pub async fn set_access_token(&self, token: Option<String>) {
		self.state.lock().await.access_token = token.map(TokenSecret::new);
	}

	/// Replaces the refresh token; rejected when the credential has no token server.
	pub async fn set_refresh_token(&self, token: Option<String>) -> Result<()> {
		if token.is_some() {
			self.ensure_refreshable()?;
		}

		self.state.lock().await.refresh_token = token.map(TokenSecret::new);

		Ok(())
	}

	/// Sets the expiry to `seconds` from now by the injected clock, or clears it.
	pub async fn set_expires_in(&self, seconds: Option<i64>) -> Result<()> {
		let expiry = seconds.map(|s| expiry_from(self.clock.now(), s)).transpose()?;

		self.state.lock().await.expiry_epoch_millis = expiry;

		Ok(())
	}

	/// Applies a token response: access token and expiry always, refresh token when present.
	pub async fn set_from_token_response(&self, response: &TokenResponse) -> Result<()> {
		let mut state = self.state.lock().await;

		self.apply_token_response(&mut state, response)
	}

	/// Counters for refresh attempts made by this credential.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Token endpoint client used for refreshes, if any.
	pub fn token_server(&self) -> Option<&TokenExchange> {
		self.token_server.as_ref()
	}

	fn needs_refresh(&self, state: &TokenRecord) -> bool {
		if state.access_token.is_none() {
			return true;
		}

		state.remaining(self.clock.now()).is_some_and(|remaining| remaining <= REFRESH_WINDOW)
	}

	fn ensure_refreshable(&self) -> Result<()> {
		if self.token_server.is_none() {
			return Err(ConfigError::RefreshWithoutTokenServer.into());
		}

		Ok(())
	}

	fn apply_token_response(
		&self,
		state: &mut TokenRecord,
		response: &TokenResponse,
	) -> Result<()> {
		if response.refresh_token.is_some() {
			self.ensure_refreshable()?;
		}

		let expiry =
			response.expires_in.map(|s| expiry_from(self.clock.now(), s)).transpose()?;

		state.access_token = Some(response.access_token.clone());
		state.expiry_epoch_millis = expiry;

		if let Some(refresh_token) = &response.refresh_token {
			state.refresh_token = Some(refresh_token.clone());
		}

		Ok(())
	}

	async fn refresh_locked(&self, state: &mut TokenRecord) -> Result<bool> {
		let (Some(refresh_token), Some(server)) = (state.refresh_token.clone(), &self.token_server)
		else {
			obs::obs_debug!("No refresh token; skipping refresh.");

			return Ok(false);
		};
		let span = FlowSpan::new(FlowKind::CredentialRefresh, "refresh");

		span.instrument(async move {
			self.metrics.record_attempt();
			obs::record_flow_outcome(FlowKind::CredentialRefresh, FlowOutcome::Attempt);

			let request = TokenRequest::new(TokenGrant::RefreshToken { refresh_token });
			let err = match server.execute(&request).await {
				Ok(response) => {
					self.apply_token_response(state, &response)?;

					let snapshot = state.clone();

					for listener in &self.listeners {
						listener.on_token_response(&snapshot, &response).await?;
					}

					self.metrics.record_success();
					obs::record_flow_outcome(FlowKind::CredentialRefresh, FlowOutcome::Success);

					return Ok(true);
				},
				Err(e) => e,
			};

			self.metrics.record_failure();
			obs::record_flow_outcome(FlowKind::CredentialRefresh, FlowOutcome::Failure);
			obs::debug_failure(FlowKind::CredentialRefresh, &err);

			if !matches!(
				err,
				Error::Transport(_) | Error::TokenResponse(_) | Error::UnparsableResponse(_)
			) {
				return Err(err);
			}

			let transient = !err.is_client_error();
			let details = match &err {
				Error::TokenResponse(inner) => Some(&inner.response),
				_ => None,
			};

			if details.is_some() && err.is_client_error() {
				state.access_token = None;
				state.expiry_epoch_millis = None;

				self.metrics.record_invalidation();
				obs::obs_warn!("Token endpoint rejected the refresh token; access token cleared.");
			}

			let snapshot = state.clone();

			for listener in &self.listeners {
				listener.on_token_error_response(&snapshot, details).await?;
			}

			if transient {
				obs::obs_warn!("Transient refresh failure; keeping the current token.");

				return Ok(false);
			}

			Err(err)
		})
		.await
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token_server", &self.token_server)
			.field("listeners", &self.listeners.len())
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Credential`].
pub struct CredentialBuilder {
	access_method: Arc<dyn AccessMethod>,
	clock: Arc<dyn Clock>,
	token_server: Option<TokenExchange>,
	listeners: Vec<Arc<dyn RefreshListener>>,
	record: TokenRecord,
}
impl CredentialBuilder {
	fn new(access_method: Arc<dyn AccessMethod>) -> Self {
		Self {
			access_method,
			clock: Arc::new(SystemClock),
			token_server: None,
			listeners: Vec::new(),
			record: TokenRecord::default(),
		}
	}

	/// Token endpoint client used to redeem the refresh token.
	pub fn with_token_server(mut self, token_server: TokenExchange) -> Self {
		self.token_server = Some(token_server);

		self
	}

	/// Overrides the clock used for expiry arithmetic.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Adds a refresh listener.
	pub fn with_refresh_listener(mut self, listener: Arc<dyn RefreshListener>) -> Self {
		self.listeners.push(listener);

		self
	}

	/// Seeds the credential with an existing record.
	pub fn with_record(mut self, record: TokenRecord) -> Self {
		self.record = record;

		self
	}

	/// Validates and builds the credential.
	pub fn build(self) -> Result<Credential> {
		if self.record.refresh_token.is_some() && self.token_server.is_none() {
			return Err(ConfigError::RefreshWithoutTokenServer.into());
		}

		Ok(Credential {
			state: AsyncMutex::new(self.record),
			access_method: self.access_method,
			clock: self.clock,
			token_server: self.token_server,
			listeners: self.listeners,
			metrics: RefreshMetrics::default(),
		})
	}
}
impl Debug for CredentialBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialBuilder")
			.field("token_server", &self.token_server)
			.field("listeners", &self.listeners.len())
			.field("record", &self.record)
			.finish_non_exhaustive()
	}
}

fn should_refresh_after(response: &HttpResponse) -> bool {
	let bearer = response
		.headers()
		.get_all(WWW_AUTHENTICATE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.find(|value| value.starts_with(BEARER_PREFIX));

	match bearer {
		Some(challenge) =>
			INVALID_TOKEN_ERROR.as_ref().is_some_and(|pattern| pattern.is_match(challenge)),
		None => response.status().as_u16() == 401,
	}
}

fn expiry_from(now: OffsetDateTime, seconds: i64) -> Result<i64> {
	let expiry =
		now.checked_add(Duration::seconds(seconds)).ok_or(ConfigError::ExpiresInOutOfRange)?;

	Ok(epoch_millis(expiry))
}

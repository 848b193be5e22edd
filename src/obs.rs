//! Optional observability helpers for token exchanges, refreshes, and request signing.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth_credentials.flow` with the `flow`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oauth_credentials_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// One round trip against the token endpoint.
	TokenExchange,
	/// Credential refresh driven by expiry or an explicit call.
	CredentialRefresh,
	/// Decision taken after a protected resource rejected a request.
	UnauthorizedResponse,
	/// OAuth 1.0a request signing.
	OAuth1Signing,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenExchange => "token_exchange",
			FlowKind::CredentialRefresh => "credential_refresh",
			FlowKind::UnauthorizedResponse => "unauthorized_response",
			FlowKind::OAuth1Signing => "oauth1_signing",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller or swallowed by policy.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a `debug` event when tracing is enabled.
macro_rules! obs_debug {
	($($arg:tt)*) => {
		#[cfg(feature = "tracing")]
		::tracing::debug!($($arg)*);
	};
}
/// Emits a `warn` event when tracing is enabled.
macro_rules! obs_warn {
	($($arg:tt)*) => {
		#[cfg(feature = "tracing")]
		::tracing::warn!($($arg)*);
	};
}
pub(crate) use {obs_debug, obs_warn};

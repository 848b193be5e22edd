//! Callbacks invoked after every refresh attempt.

// crates.io
use oauth2::basic::BasicErrorResponse;
// self
use crate::{
	_prelude::*,
	auth::{SubjectId, TokenRecord},
	exchange::TokenResponse,
	store::CredentialStore,
};

/// Boxed future returned by [`RefreshListener`] callbacks.
pub type ListenerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Observer of refresh outcomes.
///
/// Callbacks run while the credential lock is held and receive a copy of the record as it stands
/// after the outcome was applied. An error returned from a callback propagates to the caller
/// that triggered the refresh.
pub trait RefreshListener
where
	Self: Send + Sync,
{
	/// Called after a successful refresh.
	fn on_token_response<'a>(
		&'a self,
		record: &'a TokenRecord,
		response: &'a TokenResponse,
	) -> ListenerFuture<'a>;

	/// Called after a failed refresh; `error` is the structured error body when one was returned.
	fn on_token_error_response<'a>(
		&'a self,
		record: &'a TokenRecord,
		error: Option<&'a BasicErrorResponse>,
	) -> ListenerFuture<'a>;
}

/// Persists the credential's record under a subject after every refresh outcome.
///
/// Invalidated records are stored too, so a restart does not resurrect a rejected access token.
#[derive(Clone)]
pub struct StoreRefreshListener {
	store: Arc<dyn CredentialStore>,
	subject: SubjectId,
}
impl StoreRefreshListener {
	/// Creates a listener writing to `store` under `subject`.
	pub fn new(store: Arc<dyn CredentialStore>, subject: SubjectId) -> Self {
		Self { store, subject }
	}

	/// Subject the listener writes under.
	pub fn subject(&self) -> &SubjectId {
		&self.subject
	}
}
impl RefreshListener for StoreRefreshListener {
	fn on_token_response<'a>(
		&'a self,
		record: &'a TokenRecord,
		_response: &'a TokenResponse,
	) -> ListenerFuture<'a> {
		Box::pin(async move { Ok(self.store.store(&self.subject, record.clone()).await?) })
	}

	fn on_token_error_response<'a>(
		&'a self,
		record: &'a TokenRecord,
		_error: Option<&'a BasicErrorResponse>,
	) -> ListenerFuture<'a> {
		Box::pin(async move { Ok(self.store.store(&self.subject, record.clone()).await?) })
	}
}
impl Debug for StoreRefreshListener {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StoreRefreshListener").field("subject", &self.subject).finish_non_exhaustive()
	}
}

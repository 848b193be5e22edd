//! Credential store contract and the in-memory reference implementation.
//!
//! Stores are called from inside a credential's lock while refresh listeners run, so
//! implementations must not call back into the same credential.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SubjectId, TokenRecord},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for token records keyed by subject.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the record stored under `subject`, if any.
	fn load<'a>(&'a self, subject: &'a SubjectId) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Persists or replaces the record stored under `subject`.
	fn store<'a>(&'a self, subject: &'a SubjectId, record: TokenRecord) -> StoreFuture<'a, ()>;

	/// Removes the record stored under `subject`.
	///
	/// `record` is the caller's last known copy, for backends that delete conditionally.
	fn delete<'a>(&'a self, subject: &'a SubjectId, record: &'a TokenRecord)
	-> StoreFuture<'a, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl From<serde_json::Error> for StoreError {
	fn from(e: serde_json::Error) -> Self {
		Self::Serialization { message: e.to_string() }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source =
			StdError::source(&error).expect("Error should expose the original store error.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn serde_failures_map_to_serialization() {
		let e = serde_json::from_str::<TokenRecord>("{").expect_err("Truncated JSON must fail.");

		assert!(matches!(StoreError::from(e), StoreError::Serialization { .. }));
	}
}

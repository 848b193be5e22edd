//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{SubjectId, TokenRecord},
	store::{CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<SubjectId, TokenRecord>>>;

/// Keeps records in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored subjects.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true if nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn store_now(map: StoreMap, subject: SubjectId, record: TokenRecord) -> Result<(), StoreError> {
		map.write().insert(subject, record);

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn load<'a>(&'a self, subject: &'a SubjectId) -> StoreFuture<'a, Option<TokenRecord>> {
		let loaded = self.0.read().get(subject).cloned();

		Box::pin(async move { Ok(loaded) })
	}

	fn store<'a>(&'a self, subject: &'a SubjectId, record: TokenRecord) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let subject = subject.to_owned();

		Box::pin(async move { Self::store_now(map, subject, record) })
	}

	fn delete<'a>(
		&'a self,
		subject: &'a SubjectId,
		_record: &'a TokenRecord,
	) -> StoreFuture<'a, ()> {
		self.0.write().remove(subject);

		Box::pin(async { Ok(()) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn subject() -> SubjectId {
		SubjectId::new("user-1").expect("Subject fixture should be valid.")
	}

	#[tokio::test]
	async fn store_then_load_returns_equal_record() {
		let store = MemoryStore::default();
		let record = TokenRecord::default().with_access_token("access");

		store.store(&subject(), record.clone()).await.expect("Store should succeed.");

		let loaded = store.load(&subject()).await.expect("Load should succeed.");

		assert_eq!(loaded, Some(record));
		assert_eq!(loaded.and_then(|r| r.refresh_token), None);
	}

	#[tokio::test]
	async fn delete_removes_and_missing_loads_none() {
		let store = MemoryStore::default();
		let record = TokenRecord::default().with_refresh_token("refresh");

		assert_eq!(store.load(&subject()).await.expect("Load should succeed."), None);

		store.store(&subject(), record.clone()).await.expect("Store should succeed.");
		store.delete(&subject(), &record).await.expect("Delete should succeed.");

		assert!(store.is_empty());
	}
}

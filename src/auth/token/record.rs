//! The token triple owned by a credential and handed to stores and listeners.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access token, refresh token, and absolute expiry.
///
/// A record is always copied when it leaves a credential, so listeners and stores never alias
/// the live state. All fields are optional: a freshly loaded record may carry only a refresh
/// token, and an invalidated one keeps its refresh token but loses the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Bearer access token.
	pub access_token: Option<TokenSecret>,
	/// Refresh token, if the server issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry as milliseconds since the Unix epoch.
	pub expiry_epoch_millis: Option<i64>,
}
impl TokenRecord {
	/// Sets the access token.
	pub fn with_access_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.access_token = Some(token.into());

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Sets the absolute expiry.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expiry_epoch_millis = Some(epoch_millis(instant));

		self
	}

	/// Absolute expiry, if known and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let millis = self.expiry_epoch_millis?;

		OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
	}

	/// Remaining lifetime relative to `now`; negative once expired.
	pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
		self.expires_at().map(|expiry| expiry - now)
	}
}

pub(crate) fn epoch_millis(instant: OffsetDateTime) -> i64 {
	(instant.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn expiry_round_trips_through_millis() {
		let expiry = datetime!(2024-03-01 10:00:00.250 UTC);
		let record = TokenRecord::default().with_access_token("access").with_expires_at(expiry);

		assert_eq!(record.expiry_epoch_millis, Some(1_709_287_200_250));
		assert_eq!(record.expires_at(), Some(expiry));
		assert_eq!(
			record.remaining(datetime!(2024-03-01 09:59:00.250 UTC)),
			Some(Duration::seconds(60))
		);
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let record = TokenRecord::default().with_access_token("a-secret").with_refresh_token("r");
		let rendered = format!("{record:?}");

		assert!(!rendered.contains("a-secret"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn json_keeps_null_refresh_token() {
		let record = TokenRecord { access_token: Some("a".into()), ..Default::default() };
		let json = serde_json::to_string(&record).expect("Record should serialize.");

		assert_eq!(
			json,
			r#"{"access_token":"a","refresh_token":null,"expiry_epoch_millis":null}"#
		);

		let back: TokenRecord = serde_json::from_str(&json).expect("Record should deserialize.");

		assert_eq!(back, record);
	}
}

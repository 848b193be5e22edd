//! Ordered OAuth scope lists.

// std
use std::slice::Iter;
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated scope list that keeps the caller's order.
///
/// Authorization servers echo scopes back verbatim, so the first occurrence of each entry wins
/// and the wire form is the entries joined by a single space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(Vec<String>);
impl ScopeSet {
	/// Creates a scope list from any iterator, dropping duplicates.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut out = Vec::new();

		for scope in scopes {
			let scope = scope.into();

			if scope.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if scope.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope });
			}
			if !out.contains(&scope) {
				out.push(scope);
			}
		}

		Ok(Self(out))
	}

	/// Parses a space-delimited scope string as returned by token endpoints.
	pub fn parse_delimited(raw: &str) -> Self {
		let mut out = Vec::new();

		for scope in raw.split_whitespace() {
			if !out.iter().any(|s: &String| s == scope) {
				out.push(scope.to_owned());
			}
		}

		Self(out)
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|s| s == scope)
	}

	/// Iterator over scopes in insertion order.
	pub fn iter(&self) -> Iter<'_, String> {
		self.0.iter()
	}

	/// Returns the wire representation (space-delimited).
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(value: ScopeSet) -> Self {
		value.0
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = Iter<'a, String>;
	type Item = &'a String;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn keeps_first_occurrence_order() {
		let scopes = ScopeSet::new(["profile", "email", "profile", "openid"])
			.expect("Scope fixture should be valid.");

		assert_eq!(scopes.len(), 3);
		assert_eq!(scopes.normalized(), "profile email openid");
		assert!(scopes.contains("email"));
		assert!(!scopes.contains("calendar"));
	}

	#[test]
	fn rejects_empty_and_whitespace_entries() {
		assert_eq!(ScopeSet::new([""]), Err(ScopeValidationError::Empty));
		assert_eq!(
			ScopeSet::new(["read write"]),
			Err(ScopeValidationError::ContainsWhitespace { scope: "read write".into() })
		);
	}

	#[test]
	fn parses_server_echo() {
		let scopes = ScopeSet::parse_delimited("  read  write read ");

		assert_eq!(scopes.iter().map(String::as_str).collect::<Vec<_>>(), ["read", "write"]);
		assert!(ScopeSet::parse_delimited("").is_empty());
	}

	#[test]
	fn serde_validates_entries() {
		let scopes: ScopeSet = serde_json::from_str(r#"["a","b","a"]"#)
			.expect("Scope list should deserialize successfully.");

		assert_eq!(scopes.to_string(), "a b");
		assert!(serde_json::from_str::<ScopeSet>(r#"["a b"]"#).is_err());
	}
}

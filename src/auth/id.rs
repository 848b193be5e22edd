//! Validated identifiers for credential subjects and OAuth clients.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

/// Why an identifier was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierProblem {
	/// No characters at all.
	Empty,
	/// At least one Unicode whitespace character.
	Whitespace,
	/// More characters than the identifier kind allows.
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}
impl Display for IdentifierProblem {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Empty => f.write_str("is empty"),
			Self::Whitespace => f.write_str("contains whitespace"),
			Self::TooLong { max } => write!(f, "exceeds {max} characters"),
		}
	}
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
#[error("{kind} identifier {problem}.")]
pub struct IdentifierError {
	/// Identifier kind (`Subject`, `Client`).
	pub kind: &'static str,
	/// Rejection reason.
	pub problem: IdentifierProblem,
}

fn check(kind: &'static str, max: usize, raw: &str) -> Result<(), IdentifierError> {
	let problem = if raw.is_empty() {
		IdentifierProblem::Empty
	} else if raw.chars().any(char::is_whitespace) {
		IdentifierProblem::Whitespace
	} else if raw.chars().count() > max {
		IdentifierProblem::TooLong { max }
	} else {
		return Ok(());
	};

	Err(IdentifierError { kind, problem })
}

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident, $kind:literal, $max:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Longest accepted value, in characters.
			pub const MAX_LEN: usize = $max;

			/// Validates and wraps `value`.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				Self::try_from(value.into())
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check($kind, Self::MAX_LEN, &value).map(|()| Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $kind, self.0)
			}
		}
	};
}

identifier! {
	/// Key under which a credential is persisted, typically the end-user id.
	SubjectId, "Subject", 128
}
identifier! {
	/// OAuth client identifier registered with the authorization server.
	ClientId, "Client", 255
}

//! RFC 3986 percent-encoding as required by RFC 5849 §3.6.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything except the unreserved set `A-Z a-z 0-9 - . _ ~`.
const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes `value`; space becomes `%20`, never `+`.
pub fn escape(value: &str) -> String {
	utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Splits a raw `a=1&b&c=` string into decoded pairs; a key without `=` has no value.
pub(crate) fn split_pairs(raw: &str) -> Vec<(String, Option<String>)> {
	raw.split('&')
		.filter(|segment| !segment.is_empty())
		.map(|segment| match segment.split_once('=') {
			Some((key, value)) => (decode(key), Some(decode(value))),
			None => (decode(segment), None),
		})
		.collect()
}

fn decode(raw: &str) -> String {
	percent_decode_str(&raw.replace('+', " ")).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn escape_keeps_only_unreserved() {
		assert_eq!(escape("AZaz09-._~"), "AZaz09-._~");
		assert_eq!(escape("a b+c&d=e/f"), "a%20b%2Bc%26d%3De%2Ff");
		assert_eq!(escape("é"), "%C3%A9");
		assert_eq!(escape("*"), "%2A");
	}

	#[test]
	fn split_pairs_keeps_bare_keys_and_repeats() {
		assert_eq!(
			split_pairs("foo=bar&flag&&foo=b%20a+z&empty="),
			[
				("foo".to_owned(), Some("bar".to_owned())),
				("flag".into(), None),
				("foo".into(), Some("b a z".into())),
				("empty".into(), Some(String::new())),
			]
		);
	}
}

#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::macros::datetime;
// self
use oauth_credentials::{
	clock::{ManualClock, RandomSource},
	http::{HttpTransport, ReqwestTransport},
	oauth1::{HmacSha1Signer, OAuth1Authorizer, OAuthSigner},
	oauth2::http,
};

struct FixedRandom(u64);
impl RandomSource for FixedRandom {
	fn next_u64(&self) -> u64 {
		self.0
	}

	fn fill_bytes(&self, buf: &mut [u8]) {
		buf.fill(0x5a);
	}
}

#[tokio::test]
async fn signed_form_posts_reach_the_server() {
	let server = MockServer::start_async().await;
	let signer = HmacSha1Signer::new("kd94hf93k423kf44").with_token_shared_secret("pfkkdhi9sl3r4s00");
	let authorizer = OAuth1Authorizer::builder("dpf43f3p2l4k3l03", Arc::new(signer.clone()))
		.with_token("nnch734d00sl2jdk")
		.with_version("1.0")
		.with_clock(Arc::new(ManualClock::new(datetime!(2011-03-02 12:00 UTC))))
		.with_random_source(Arc::new(FixedRandom(0x2a)))
		.build();
	let mut request = http::Request::builder()
		.method("POST")
		.uri(server.url("/photos?size=original"))
		.header("content-type", "application/x-www-form-urlencoded")
		.body(b"file=vacation.jpg".to_vec())
		.expect("Request fixture should build.");
	let params = authorizer.authorize(&mut request).expect("Signing should succeed.");

	assert_eq!(params.nonce.as_deref(), Some("2a"));
	assert_eq!(params.timestamp.as_deref(), Some("1299067200"));
	assert_eq!(params.signature_method.as_deref(), Some("HMAC-SHA1"));

	let base = params
		.signature_base_string("POST", request.uri(), Some(request.body()))
		.expect("Base string should build.");

	assert!(base.starts_with("POST&http%3A%2F%2F127.0.0.1%3A"));
	assert!(base.contains("file%3Dvacation.jpg"));
	assert!(base.contains("size%3Doriginal"));
	assert_eq!(
		params.signature.as_deref(),
		Some(signer.compute_signature(&base).expect("Signing should succeed.").as_str())
	);

	let header = request.headers()["authorization"]
		.to_str()
		.expect("Header should be ASCII.")
		.to_owned();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/photos")
				.query_param("size", "original")
				.header("authorization", header.as_str());
			then.status(204);
		})
		.await;
	let response = ReqwestTransport::new()
		.expect("Reqwest transport should build.")
		.send(request)
		.await
		.expect("Signed request should be delivered.");

	mock.assert_async().await;

	assert_eq!(response.status().as_u16(), 204);
	assert!(header.starts_with("OAuth oauth_consumer_key=\"dpf43f3p2l4k3l03\", oauth_nonce=\"2a\""));
}

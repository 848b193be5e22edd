#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::{Duration, macros::datetime};
// self
use oauth_credentials::{
	access::AuthorizationHeaderAccess,
	auth::{ClientId, SubjectId, TokenRecord},
	clock::ManualClock,
	credential::{Credential, StoreRefreshListener},
	error::Error,
	exchange::{ClientSecretPost, TokenExchange},
	http::ReqwestTransport,
	oauth2::http,
	store::{CredentialStore, MemoryStore},
	url::Url,
};

fn token_server(server: &MockServer) -> TokenExchange {
	let client_id = ClientId::new("client-refresh").expect("Client identifier should be valid.");

	TokenExchange::new(
		Arc::new(ReqwestTransport::new().expect("Reqwest transport should build.")),
		Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully."),
		Arc::new(ClientSecretPost::new(client_id, Some("secret-refresh".into()))),
	)
	.expect("Token exchange should accept the mock endpoint.")
}

fn resource_request(server: &MockServer) -> http::Request<Vec<u8>> {
	http::Request::builder()
		.uri(server.url("/resource"))
		.body(Vec::new())
		.expect("Resource request fixture should build.")
}

#[tokio::test]
async fn expiring_tokens_refresh_and_persist() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "refresh-old")
				.form_urlencoded_tuple("client_id", "client-refresh");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 00:00 UTC)));
	let store = MemoryStore::default();
	let subject = SubjectId::new("subject-1").expect("Subject identifier should be valid.");
	let record = TokenRecord::default()
		.with_access_token("access-old")
		.with_refresh_token("refresh-old")
		.with_expires_at(datetime!(2024-01-01 00:00:30 UTC));
	let credential = Credential::builder(Arc::new(AuthorizationHeaderAccess))
		.with_token_server(token_server(&server))
		.with_clock(clock.clone())
		.with_refresh_listener(Arc::new(StoreRefreshListener::new(
			Arc::new(store.clone()),
			subject.clone(),
		)))
		.with_record(record)
		.build()
		.expect("Credential should build.");
	let mut request = resource_request(&server);

	credential.intercept(&mut request).await.expect("Intercept should refresh and attach.");

	mock.assert_calls_async(1).await;

	assert_eq!(request.headers()["authorization"], "Bearer access-new");
	assert_eq!(credential.expires_in().await, Some(Duration::hours(1)));

	let stored = store
		.load(&subject)
		.await
		.expect("Store load should succeed.")
		.expect("Refreshed record should be persisted.");

	assert_eq!(stored.access_token.as_ref().map(|secret| secret.expose()), Some("access-new"));
	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-new"));

	// Still fresh: no second round trip.
	let mut again = resource_request(&server);

	credential.intercept(&mut again).await.expect("Intercept should attach the cached token.");

	mock.assert_calls_async(1).await;
	assert_eq!(credential.metrics().successes(), 1);
}

#[tokio::test]
async fn unauthorized_responses_refresh_once_and_retry() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-rotated\",\"token_type\":\"bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let credential = Credential::builder(Arc::new(AuthorizationHeaderAccess))
		.with_token_server(token_server(&server))
		.with_record(
			TokenRecord::default().with_access_token("access-old").with_refresh_token("refresh-1"),
		)
		.build()
		.expect("Credential should build.");
	let mut request = resource_request(&server);

	credential.intercept(&mut request).await.expect("Intercept should attach the token.");

	let rejected = http::Response::builder()
		.status(401)
		.header("www-authenticate", "Bearer realm=\"api\", error=\"invalid_token\"")
		.body(Vec::new())
		.expect("Rejection fixture should build.");
	let retry = credential
		.handle_unauthorized_response(&request, &rejected)
		.await
		.expect("Unauthorized handling should succeed.");

	assert!(retry);
	assert_eq!(
		credential.access_token().await.as_ref().map(|secret| secret.expose()),
		Some("access-rotated")
	);

	// The stale request already lost the race; no second refresh is needed.
	let retry_stale = credential
		.handle_unauthorized_response(&request, &rejected)
		.await
		.expect("Unauthorized handling should succeed.");

	assert!(retry_stale);
	mock.assert_calls_async(1).await;

	let insufficient = http::Response::builder()
		.status(403)
		.header("www-authenticate", "Bearer error=\"insufficient_scope\"")
		.body(Vec::new())
		.expect("Rejection fixture should build.");

	assert!(
		!credential
			.handle_unauthorized_response(&request, &insufficient)
			.await
			.expect("Unauthorized handling should succeed.")
	);
}

#[tokio::test]
async fn revoked_refresh_tokens_invalidate_the_record() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let store = MemoryStore::default();
	let subject = SubjectId::new("subject-revoked").expect("Subject identifier should be valid.");
	let credential = Credential::builder(Arc::new(AuthorizationHeaderAccess))
		.with_token_server(token_server(&server))
		.with_refresh_listener(Arc::new(StoreRefreshListener::new(
			Arc::new(store.clone()),
			subject.clone(),
		)))
		.with_record(TokenRecord::default().with_refresh_token("refresh-revoked"))
		.build()
		.expect("Credential should build.");
	let mut request = resource_request(&server);
	let err = credential
		.intercept(&mut request)
		.await
		.expect_err("A rejected refresh token should fail the intercept.");

	assert!(matches!(err, Error::TokenResponse(_)), "Unexpected error: {err:?}");
	assert!(request.headers().get("authorization").is_none());
	assert_eq!(credential.metrics().invalidations(), 1);

	let stored = store
		.load(&subject)
		.await
		.expect("Store load should succeed.")
		.expect("Invalidated record should be persisted.");

	assert!(stored.access_token.is_none());
	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-revoked"));
}

#[tokio::test]
async fn server_errors_keep_the_current_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500).header("content-type", "application/json").body("{\"error\":\"server_error\"}");
		})
		.await;
	let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 00:00 UTC)));
	let credential = Credential::builder(Arc::new(AuthorizationHeaderAccess))
		.with_token_server(token_server(&server))
		.with_clock(clock)
		.with_record(
			TokenRecord::default()
				.with_access_token("access-current")
				.with_refresh_token("refresh-1")
				.with_expires_at(datetime!(2024-01-01 00:00:10 UTC)),
		)
		.build()
		.expect("Credential should build.");
	let mut request = resource_request(&server);

	credential.intercept(&mut request).await.expect("Transient failures should not surface.");

	mock.assert_calls_async(1).await;

	assert_eq!(request.headers()["authorization"], "Bearer access-current");
	assert_eq!(credential.metrics().failures(), 1);
	assert_eq!(credential.metrics().invalidations(), 0);
}

//! Walks through an installed-app authorization code flow: build the authorization URL with
//! PKCE, read the redirect the browser lands on, and prepare the code exchange.
//!
//! Set `OAUTH_DEMO_EXCHANGE=1` to actually post the code to the token endpoint.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use oauth_credentials::{
	access::AuthorizationHeaderAccess,
	auth::{ClientId, ScopeSet, SubjectId},
	exchange::{ClientSecretPost, TokenExchange},
	flow::{AuthorizationCodeFlow, AuthorizationResponseUrl},
	http::ReqwestTransport,
	oauth2::http,
	store::MemoryStore,
	url::Url,
};

const REDIRECT_URI: &str = "http://127.0.0.1:8765/callback";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = ClientId::new("demo-client")?;
	let exchange = TokenExchange::new(
		Arc::new(ReqwestTransport::new()?),
		Url::parse("https://provider.example.com/token")?,
		Arc::new(ClientSecretPost::new(client_id.clone(), None)),
	)?;
	let flow = AuthorizationCodeFlow::builder(
		Arc::new(AuthorizationHeaderAccess),
		exchange,
		client_id,
		Url::parse("https://provider.example.com/authorize")?,
	)
	.with_scopes(ScopeSet::new(["openid", "profile"])?)
	.with_store(Arc::new(MemoryStore::default()))
	.with_pkce()
	.build()?;
	let authorization_url =
		flow.new_authorization_url().with_redirect_uri(REDIRECT_URI).with_state("demo-state");

	println!("Send your user to {authorization_url}.");

	// Simulate the browser landing on the redirect URI.
	let callback = Url::parse(&format!("{REDIRECT_URI}?code=demo-code&state=demo-state"))?;
	let response = AuthorizationResponseUrl::parse(&callback)?;

	if !response.state_matches("demo-state") {
		eprintln!("State `{:?}` was not recognized.", response.state());

		return Ok(());
	}

	let Some(code) = response.code() else {
		eprintln!("Authorization was denied: {response:?}.");

		return Ok(());
	};
	let token_request =
		flow.new_token_request_for(&authorization_url, code.expose(), REDIRECT_URI);

	println!(
		"Token request fields: {:?}.",
		token_request.request().form_fields().iter().map(|(k, _)| k).collect::<Vec<_>>()
	);

	if std::env::var_os("OAUTH_DEMO_EXCHANGE").is_none() {
		println!("Set OAUTH_DEMO_EXCHANGE=1 to post the code to the token endpoint.");

		return Ok(());
	}

	let tokens = token_request.execute().await?;
	let credential =
		flow.create_and_store_credential(&tokens, &SubjectId::new("demo-user")?).await?;
	let mut request =
		http::Request::builder().uri("https://provider.example.com/userinfo").body(Vec::new())?;

	credential.intercept(&mut request).await?;

	println!("Authorized request headers: {:?}.", request.headers().keys().collect::<Vec<_>>());

	Ok(())
}

//! Authorization code flow: authorization URL, code exchange, and credential persistence.

pub mod pkce;
pub mod request_url;
pub mod response_url;

pub use pkce::*;
pub use request_url::*;
pub use response_url::*;

// self
use crate::{
	_prelude::*,
	access::AccessMethod,
	auth::{ClientId, ScopeSet, SubjectId, TokenSecret},
	clock::{Clock, OsRandom, RandomSource, SystemClock},
	credential::{Credential, CredentialBuilder, RefreshListener, StoreRefreshListener},
	error::ConfigError,
	exchange::{TokenExchange, TokenGrant, TokenRequest, TokenResponse},
	store::CredentialStore,
};

/// Authorization code flow bound to one client and one authorization server.
pub struct AuthorizationCodeFlow {
	access_method: Arc<dyn AccessMethod>,
	token_exchange: TokenExchange,
	client_id: ClientId,
	authorization_endpoint: Url,
	scopes: ScopeSet,
	store: Option<Arc<dyn CredentialStore>>,
	clock: Arc<dyn Clock>,
	rng: Arc<dyn RandomSource>,
	pkce: bool,
	listeners: Vec<Arc<dyn RefreshListener>>,
}
impl AuthorizationCodeFlow {
	/// Starts a builder with the required collaborators.
	pub fn builder(
		access_method: Arc<dyn AccessMethod>,
		token_exchange: TokenExchange,
		client_id: ClientId,
		authorization_endpoint: Url,
	) -> AuthorizationCodeFlowBuilder {
		AuthorizationCodeFlowBuilder {
			access_method,
			token_exchange,
			client_id,
			authorization_endpoint,
			scopes: ScopeSet::default(),
			store: None,
			clock: Arc::new(SystemClock),
			rng: Arc::new(OsRandom),
			pkce: false,
			listeners: Vec::new(),
		}
	}

	/// Authorization URL with `response_type=code`, the client id, and the configured scopes.
	///
	/// With PKCE enabled a fresh pair is generated per URL; redeem the code with
	/// [`new_token_request_for`](Self::new_token_request_for) so the verifier travels along.
	pub fn new_authorization_url(&self) -> AuthorizationRequestUrl {
		let url = authorization_code_url(self.authorization_endpoint.clone(), &self.client_id)
			.with_scopes(&self.scopes);

		if self.pkce { url.with_pkce(PkcePair::generate(self.rng.as_ref())) } else { url }
	}

	/// Token request redeeming `code`, bound to the redirect URI used on the authorization URL.
	pub fn new_token_request(
		&self,
		code: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> AuthorizationCodeTokenRequest<'_> {
		AuthorizationCodeTokenRequest {
			flow: self,
			request: TokenRequest::new(TokenGrant::authorization_code(code, redirect_uri))
				.with_scopes(self.scopes.clone()),
		}
	}

	/// Builds a credential from `response`, persisting it under `subject` when a store is set.
	///
	/// The credential gets a refresh listener that keeps the store current.
	pub async fn create_and_store_credential(
		&self,
		response: &TokenResponse,
		subject: &SubjectId,
	) -> Result<Credential> {
		let credential = self.new_credential(subject).build()?;

		credential.set_from_token_response(response).await?;

		if let Some(store) = &self.store {
			store.store(subject, credential.snapshot().await).await?;
		}

		Ok(credential)
	}

	/// Token request redeeming `code` that was issued for `url`.
	///
	/// Copies the verifier of the PKCE pair carried by `url`, if any.
	pub fn new_token_request_for(
		&self,
		url: &AuthorizationRequestUrl,
		code: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> AuthorizationCodeTokenRequest<'_> {
		let request = self.new_token_request(code, redirect_uri);

		match url.pkce() {
			Some(pkce) => request.with_pkce_verifier(pkce.verifier()),
			None => request,
		}
	}

	/// Credential loaded from the store, or `None` when there is no store or no record.
	pub async fn load_credential(&self, subject: &SubjectId) -> Result<Option<Credential>> {
		let Some(store) = &self.store else {
			return Ok(None);
		};
		let Some(record) = store.load(subject).await? else {
			return Ok(None);
		};

		Ok(Some(self.new_credential(subject).with_record(record).build()?))
	}

	/// Removes the stored record for `subject`; returns whether one existed.
	pub async fn delete_credential(&self, subject: &SubjectId) -> Result<bool> {
		let Some(store) = &self.store else {
			return Ok(false);
		};
		let Some(record) = store.load(subject).await? else {
			return Ok(false);
		};

		store.delete(subject, &record).await?;

		Ok(true)
	}

	/// Client identifier.
	pub fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	/// Token endpoint client.
	pub fn token_exchange(&self) -> &TokenExchange {
		&self.token_exchange
	}

	/// Scopes requested by default.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	fn new_credential(&self, subject: &SubjectId) -> CredentialBuilder {
		let mut builder = Credential::builder(self.access_method.clone())
			.with_token_server(self.token_exchange.clone())
			.with_clock(self.clock.clone());

		if let Some(store) = &self.store {
			builder = builder.with_refresh_listener(Arc::new(StoreRefreshListener::new(
				store.clone(),
				subject.to_owned(),
			)));
		}

		self.listeners.iter().fold(builder, |b, l| b.with_refresh_listener(l.clone()))
	}
}
impl Debug for AuthorizationCodeFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeFlow")
			.field("client_id", &self.client_id)
			.field("authorization_endpoint", &self.authorization_endpoint.as_str())
			.field("token_exchange", &self.token_exchange)
			.field("scopes", &self.scopes)
			.field("pkce", &self.pkce)
			.finish_non_exhaustive()
	}
}

/// Builder for [`AuthorizationCodeFlow`].
pub struct AuthorizationCodeFlowBuilder {
	access_method: Arc<dyn AccessMethod>,
	token_exchange: TokenExchange,
	client_id: ClientId,
	authorization_endpoint: Url,
	scopes: ScopeSet,
	store: Option<Arc<dyn CredentialStore>>,
	clock: Arc<dyn Clock>,
	rng: Arc<dyn RandomSource>,
	pkce: bool,
	listeners: Vec<Arc<dyn RefreshListener>>,
}
impl AuthorizationCodeFlowBuilder {
	/// Scopes requested on the authorization URL and token request.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Store used to persist credentials.
	pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Clock handed to every credential.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Random source for PKCE verifiers.
	pub fn with_random_source(mut self, rng: Arc<dyn RandomSource>) -> Self {
		self.rng = rng;

		self
	}

	/// Enables PKCE (S256).
	pub fn with_pkce(mut self) -> Self {
		self.pkce = true;

		self
	}

	/// Adds a refresh listener to every credential the flow creates.
	pub fn with_refresh_listener(mut self, listener: Arc<dyn RefreshListener>) -> Self {
		self.listeners.push(listener);

		self
	}

	/// Validates and builds the flow.
	pub fn build(self) -> Result<AuthorizationCodeFlow> {
		if !matches!(self.authorization_endpoint.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidEndpoint {
				endpoint: "authorization",
				url: self.authorization_endpoint.into(),
			}
			.into());
		}

		Ok(AuthorizationCodeFlow {
			access_method: self.access_method,
			token_exchange: self.token_exchange,
			client_id: self.client_id,
			authorization_endpoint: self.authorization_endpoint,
			scopes: self.scopes,
			store: self.store,
			clock: self.clock,
			rng: self.rng,
			pkce: self.pkce,
			listeners: self.listeners,
		})
	}
}
impl Debug for AuthorizationCodeFlowBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeFlowBuilder")
			.field("client_id", &self.client_id)
			.field("authorization_endpoint", &self.authorization_endpoint.as_str())
			.finish_non_exhaustive()
	}
}

/// Pending authorization code exchange.
#[derive(Debug)]
pub struct AuthorizationCodeTokenRequest<'a> {
	flow: &'a AuthorizationCodeFlow,
	request: TokenRequest,
}
impl AuthorizationCodeTokenRequest<'_> {
	/// Adds the PKCE verifier matching the challenge on the authorization URL.
	pub fn with_pkce_verifier(mut self, verifier: &TokenSecret) -> Self {
		if let TokenGrant::AuthorizationCode { code_verifier, .. } = &mut self.request.grant {
			*code_verifier = Some(verifier.clone());
		}

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.request = self.request.with_scopes(scopes);

		self
	}

	/// Appends an extension parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.request = self.request.with_param(key, value);

		self
	}

	/// Request that will be sent.
	pub fn request(&self) -> &TokenRequest {
		&self.request
	}

	/// Exchanges the code at the token endpoint.
	///
	/// Fails before sending when the flow uses PKCE and no verifier was attached.
	pub async fn execute(self) -> Result<TokenResponse> {
		if self.flow.pkce
			&& matches!(
				self.request.grant,
				TokenGrant::AuthorizationCode { code_verifier: None, .. }
			) {
			return Err(ConfigError::MissingPkceVerifier.into());
		}

		self.flow.token_exchange.execute(&self.request).await
	}
}

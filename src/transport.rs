//! The NTLM handshake around an arbitrary request executor.


use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use reqwest::{Client, Method, Request, Response, StatusCode};
use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::engine::{ClientSession, Mode, NtlmClientEngine, ProtocolEngine, Version};
use crate::error::Error;
use crate::executor::RequestExecutor;
use crate::header::{ChallengeToken, authorization_value, decode_token, find_challenge};
use crate::negotiate::negotiate_message;


const USER_AGENT: &str = concat!("ntlm-transport/", env!("CARGO_PKG_VERSION"));


/// The credentials with which to answer NTLM challenges.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Credentials {
    pub domain: String,
    pub username: String,
    pub password: String,
}
impl Credentials {
    pub fn new<D: Into<String>, U: Into<String>, P: Into<String>>(
        domain: D,
        username: U,
        password: P,
    ) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}


/// What the server made of the negotiate probe.
enum Probe {
    /// The server did not ask for NTLM; this is its response to the probe.
    Passed(Response),

    /// The server sent a challenge; this is the `Authorization` value answering it.
    Challenged(HeaderValue),
}


/// A request executor which authenticates requests using NTLM.
///
/// Every request is preceded by a body-less `GET` probe to the same URL carrying an NTLM
/// Negotiate message. If the server answers with anything but 401, that answer is returned as-is.
/// Otherwise, the challenge is answered and the original request is sent with the resulting
/// `Authorization` header through the same executor. NTLM authenticates connections, not
/// requests, so the executor must be able to reuse the probe's connection for the replay;
/// a keep-alive HTTP/1.1 pool (such as the one of [`reqwest::Client`]) does.
///
/// The transport keeps no state between requests and may be shared between tasks.
pub struct NtlmTransport<X = Client, G = NtlmClientEngine> {
    executor: X,
    engine: G,
    credentials: Credentials,
}
impl NtlmTransport {
    /// A transport around a default HTTP client.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> Builder {
        Builder::new(credentials)
    }
}
impl<X, G> NtlmTransport<X, G> {
    pub fn from_parts(executor: X, engine: G, credentials: Credentials) -> Self {
        Self {
            executor,
            engine,
            credentials,
        }
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn engine(&self) -> &G {
        &self.engine
    }
}
impl<X: RequestExecutor + Sync, G: ProtocolEngine + Sync> NtlmTransport<X, G> {
    /// Executes the request, authenticating with NTLM if the server asks for it.
    ///
    /// If the server offers NTLM but sends an empty challenge, the whole handshake is attempted a
    /// second time before giving up with [`Error::EmptyChallenge`].
    pub async fn execute(&self, mut request: Request) -> Result<Response, Error> {
        let probe = match self.probe(&request).await {
            Err(Error::EmptyChallenge) => {
                warn!("empty NTLM challenge from {}; restarting handshake", request.url());
                self.probe(&request).await?
            },
            other => other?,
        };

        let authorization = match probe {
            Probe::Passed(response) => return Ok(response),
            Probe::Challenged(a) => a,
        };

        request.headers_mut().insert(AUTHORIZATION, authorization);
        debug!("sending {} {} with NTLM authentication", request.method(), request.url());
        self.executor.execute(request).await
            .map_err(Error::transport)
    }

    async fn probe(&self, request: &Request) -> Result<Probe, Error> {
        let mut probe = Request::new(Method::GET, request.url().clone());
        *probe.timeout_mut() = request.timeout().copied();
        *probe.version_mut() = request.version();
        probe.headers_mut().insert(AUTHORIZATION, authorization_value(&negotiate_message())?);

        debug!("sending NTLM negotiate probe to {}", request.url());
        let mut response = self.executor.execute(probe).await
            .map_err(Error::transport)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            debug!("probe answered with {}; no NTLM handshake necessary", response.status());
            return Ok(Probe::Passed(response));
        }

        // the connection can only be reused once the body has been read completely
        let headers = std::mem::take(response.headers_mut());
        response.bytes().await
            .map_err(Error::transport)?;

        let token = match find_challenge(&headers) {
            ChallengeToken::Missing => return Err(Error::MissingChallengeHeader),
            ChallengeToken::Empty => return Err(Error::EmptyChallenge),
            ChallengeToken::Present(t) => t,
        };
        debug!("received NTLM challenge from {}", request.url());
        self.answer_challenge(token)
            .map(Probe::Challenged)
    }

    /// Produces the `Authorization` value answering the given base64 challenge token.
    fn answer_challenge(&self, token: &str) -> Result<HeaderValue, Error> {
        let challenge_bytes = decode_token(token)?;

        let mut session = self.engine.create_client_session(Version::V2, Mode::Connectionless)
            .map_err(Error::engine)?;
        session.set_user_info(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.domain,
        );

        let challenge = self.engine.parse_challenge_message(&challenge_bytes)
            .map_err(Error::engine)?;
        session.process_challenge_message(challenge)
            .map_err(Error::engine)?;
        let authenticate = session.generate_authenticate_message()
            .map_err(Error::engine)?;

        Ok(authorization_value(&authenticate)?)
    }
}
impl<X, G> RequestExecutor for NtlmTransport<X, G>
    where
        X: RequestExecutor + Sync,
        G: ProtocolEngine + Sync,
{
    type Error = Error;

    fn execute(&self, request: Request) -> impl Future<Output = Result<Response, Self::Error>> + Send {
        NtlmTransport::execute(self, request)
    }
}
impl<X, G: fmt::Debug> fmt::Debug for NtlmTransport<X, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtlmTransport")
            .field("engine", &self.engine)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}


/// Configures an [`NtlmTransport`].
#[derive(Debug)]
pub struct Builder {
    credentials: Credentials,
    cookie_jar: Option<Arc<Jar>>,
    cookie_store: bool,
    user_agent: String,
    workstation: String,
}
impl Builder {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            cookie_jar: None,
            cookie_store: true,
            user_agent: USER_AGENT.to_owned(),
            workstation: String::new(),
        }
    }

    /// Shares the given cookie jar with the default client. Takes precedence over
    /// [`cookie_store`](Self::cookie_store).
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Whether the default client keeps cookies of its own. Enabled by default.
    pub fn cookie_store(mut self, enable: bool) -> Self {
        self.cookie_store = enable;
        self
    }

    pub fn user_agent<U: Into<String>>(mut self, user_agent: U) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The workstation name sent in the Authenticate message. Empty by default.
    pub fn workstation<W: Into<String>>(mut self, workstation: W) -> Self {
        self.workstation = workstation.into();
        self
    }

    /// Builds the transport around a default HTTP client.
    ///
    /// The client speaks HTTP/1.1 only, since NTLM cannot authenticate a multiplexed connection.
    pub fn build(self) -> Result<NtlmTransport, Error> {
        let mut client_builder = Client::builder()
            .user_agent(self.user_agent.as_str())
            .http1_only();
        client_builder = match self.cookie_jar.as_ref() {
            Some(jar) => client_builder.cookie_provider(Arc::clone(jar)),
            None => client_builder.cookie_store(self.cookie_store),
        };
        let client = client_builder.build()
            .map_err(Error::ClientBuild)?;
        Ok(self.build_with(client))
    }

    /// Builds the transport around the given executor; client settings of the builder are ignored.
    pub fn build_with<X: RequestExecutor>(self, executor: X) -> NtlmTransport<X> {
        NtlmTransport::from_parts(
            executor,
            NtlmClientEngine::with_workstation(self.workstation),
            self.credentials,
        )
    }
}

use std::fmt;

use reqwest::header::InvalidHeaderValue;


/// A boxed error from a collaborator (request executor or protocol engine), kept as obtained.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;


/// An error that may occur while executing a request through the NTLM transport.
#[derive(Debug)]
pub enum Error {
    /// The underlying request executor failed, either while sending a request or while draining
    /// the body of the probe response.
    Transport(BoxError),

    /// The server answered the probe with 401 but did not offer the NTLM scheme.
    MissingChallengeHeader,

    /// The server offered the NTLM scheme without a challenge token.
    ///
    /// Some servers do this sporadically; the transport retries the handshake once before
    /// returning this error.
    EmptyChallenge,

    /// The challenge token is not valid base64.
    ChallengeDecode(base64::DecodeError),

    /// The protocol engine rejected the challenge or failed to produce an Authenticate message.
    Engine(BoxError),

    /// The Authenticate message could not be turned into a header value.
    InvalidHeader(InvalidHeaderValue),

    /// The default HTTP client could not be constructed.
    ClientBuild(reqwest::Error),
}
impl Error {
    pub(crate) fn transport<E: Into<BoxError>>(e: E) -> Self {
        Self::Transport(e.into())
    }

    pub(crate) fn engine<E: Into<BoxError>>(e: E) -> Self {
        Self::Engine(e.into())
    }

    /// Whether this is the empty-challenge condition which warrants a fresh handshake.
    pub fn is_empty_challenge(&self) -> bool {
        matches!(self, Self::EmptyChallenge)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e)
                => write!(f, "transport error: {}", e),
            Self::MissingChallengeHeader
                => write!(f, "401 response without an NTLM WWW-Authenticate header"),
            Self::EmptyChallenge
                => write!(f, "401 response with an empty NTLM challenge"),
            Self::ChallengeDecode(e)
                => write!(f, "failed to decode NTLM challenge: {}", e),
            Self::Engine(e)
                => write!(f, "NTLM protocol engine error: {}", e),
            Self::InvalidHeader(e)
                => write!(f, "invalid Authorization header value: {}", e),
            Self::ClientBuild(e)
                => write!(f, "failed to build HTTP client: {}", e),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e.as_ref()),
            Self::ChallengeDecode(e) => Some(e),
            Self::Engine(e) => Some(e.as_ref()),
            Self::InvalidHeader(e) => Some(e),
            Self::ClientBuild(e) => Some(e),
            Self::MissingChallengeHeader|Self::EmptyChallenge => None,
        }
    }
}
impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self { Self::ChallengeDecode(e) }
}
impl From<InvalidHeaderValue> for Error {
    fn from(e: InvalidHeaderValue) -> Self { Self::InvalidHeader(e) }
}

//! The NTLM protocol engine consulted during the handshake.
//!
//! The transport treats NTLM messages as opaque bytes; everything that looks inside them happens
//! behind [`ProtocolEngine`] and [`ClientSession`]. [`NtlmClientEngine`] implements both on top of
//! the `ntlmclient` crate.


use std::fmt;

use ntlmclient::{
    ChallengeMessage, ChallengeResponse, Credentials, Flags, Message, ParsingError, StoringError,
};

use crate::negotiate::negotiate_flags;


/// The NTLM response algorithm a session computes.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Version {
    /// NTLMv1. [`NtlmClientEngine`] refuses to create sessions for it.
    V1,

    /// NTLMv2.
    V2,
}

/// Whether the session negotiated its flags in a preceding Negotiate message.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Mode {
    /// The flags are those of our Negotiate message, narrowed down by the Challenge.
    ConnectionOriented,

    /// The flags are taken from the Challenge message.
    Connectionless,
}


/// Creates client sessions and parses server challenges.
pub trait ProtocolEngine {
    /// The error reported by the engine and its sessions.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A parsed Challenge message.
    type Challenge;

    /// A client-side authentication session.
    type Session: ClientSession<Challenge = Self::Challenge, Error = Self::Error>;

    /// Creates a fresh client session.
    fn create_client_session(&self, version: Version, mode: Mode) -> Result<Self::Session, Self::Error>;

    /// Parses the raw bytes of a Challenge message.
    fn parse_challenge_message(&self, bytes: &[u8]) -> Result<Self::Challenge, Self::Error>;
}

/// One client-side authentication attempt.
pub trait ClientSession {
    type Error: std::error::Error + Send + Sync + 'static;
    type Challenge;

    fn set_user_info(&mut self, username: &str, password: &str, domain: &str);

    fn process_challenge_message(&mut self, challenge: Self::Challenge) -> Result<(), Self::Error>;

    /// Produces the raw bytes of the Authenticate message answering the processed challenge.
    fn generate_authenticate_message(&mut self) -> Result<Vec<u8>, Self::Error>;
}


/// An error reported by [`NtlmClientEngine`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum EngineError {
    /// The challenge bytes could not be parsed.
    Parsing(ParsingError),

    /// The Authenticate message could not be serialized.
    Storing(StoringError),

    /// The bytes held an NTLM message other than a Challenge.
    NotAChallenge { message_type: u32 },

    /// An Authenticate message was requested before any credentials were set.
    NoCredentials,

    /// An Authenticate message was requested before a challenge was processed.
    NoChallenge,

    /// The engine cannot compute responses of this version.
    UnsupportedVersion(Version),
}
impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing(e)
                => write!(f, "failed to parse challenge message: {}", e),
            Self::Storing(e)
                => write!(f, "failed to store authenticate message: {}", e),
            Self::NotAChallenge { message_type }
                => write!(f, "expected a challenge message (type 2), obtained type {}", message_type),
            Self::NoCredentials
                => write!(f, "no credentials have been set on the session"),
            Self::NoChallenge
                => write!(f, "no challenge has been processed by the session"),
            Self::UnsupportedVersion(v)
                => write!(f, "NTLM version {:?} is not supported", v),
        }
    }
}
impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parsing(e) => Some(e),
            Self::Storing(e) => Some(e),
            _ => None,
        }
    }
}
impl From<ParsingError> for EngineError {
    fn from(e: ParsingError) -> Self { Self::Parsing(e) }
}
impl From<StoringError> for EngineError {
    fn from(e: StoringError) -> Self { Self::Storing(e) }
}


/// The default protocol engine, computing responses with `ntlmclient`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NtlmClientEngine {
    workstation: String,
}
impl NtlmClientEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose Authenticate messages name the given workstation.
    pub fn with_workstation<W: Into<String>>(workstation: W) -> Self {
        Self {
            workstation: workstation.into(),
        }
    }

    pub fn workstation(&self) -> &str {
        &self.workstation
    }
}
impl ProtocolEngine for NtlmClientEngine {
    type Error = EngineError;
    type Challenge = ChallengeMessage;
    type Session = NtlmClientSession;

    fn create_client_session(&self, version: Version, mode: Mode) -> Result<Self::Session, Self::Error> {
        // ntlmclient 0.2 panics while computing NTLMv1 responses
        if version != Version::V2 {
            return Err(EngineError::UnsupportedVersion(version));
        }
        Ok(NtlmClientSession {
            mode,
            workstation: self.workstation.clone(),
            credentials: None,
            challenge: None,
        })
    }

    fn parse_challenge_message(&self, bytes: &[u8]) -> Result<Self::Challenge, Self::Error> {
        match Message::try_from(bytes)? {
            Message::Challenge(c) => Ok(c),
            other => Err(EngineError::NotAChallenge { message_type: other.message_number() }),
        }
    }
}


/// A session of [`NtlmClientEngine`].
pub struct NtlmClientSession {
    mode: Mode,
    workstation: String,
    credentials: Option<Credentials>,
    challenge: Option<ChallengeMessage>,
}
impl NtlmClientSession {
    /// The flags placed into the Authenticate message.
    fn authenticate_flags(&self, challenge: &ChallengeMessage) -> Flags {
        let mut flags = match self.mode {
            Mode::ConnectionOriented => negotiate_flags() & challenge.flags,
            Mode::Connectionless => challenge.flags,
        };

        // no signing or sealing happens over HTTP, so there is no session key to exchange
        flags.remove(
            Flags::NEGOTIATE_SIGN
            | Flags::NEGOTIATE_SEAL
            | Flags::NEGOTIATE_KEY_EXCHANGE
        );

        // strings are encoded exactly one way
        if flags.contains(Flags::NEGOTIATE_UNICODE) {
            flags.remove(Flags::NEGOTIATE_OEM);
        } else if !flags.contains(Flags::NEGOTIATE_OEM) {
            flags.insert(Flags::NEGOTIATE_UNICODE);
        }
        flags.insert(Flags::NEGOTIATE_NTLM);

        flags
    }

    /// The NTLMv2 response, whose blob echoes the challenge's target information.
    fn respond(&self, challenge: &ChallengeMessage, creds: &Credentials) -> ChallengeResponse {
        let target_info_bytes: Vec<u8> = challenge.target_information
            .iter()
            .flat_map(|ie| ie.to_bytes())
            .collect();
        ntlmclient::respond_challenge_ntlm_v2(
            challenge.challenge,
            &target_info_bytes,
            ntlmclient::get_ntlm_time(),
            creds,
        )
    }
}
impl fmt::Debug for NtlmClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtlmClientSession")
            .field("mode", &self.mode)
            .field("workstation", &self.workstation)
            .field("has_credentials", &self.credentials.is_some())
            .field("challenge", &self.challenge)
            .finish()
    }
}
impl ClientSession for NtlmClientSession {
    type Error = EngineError;
    type Challenge = ChallengeMessage;

    fn set_user_info(&mut self, username: &str, password: &str, domain: &str) {
        self.credentials = Some(Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
            domain: domain.to_owned(),
        });
    }

    fn process_challenge_message(&mut self, challenge: Self::Challenge) -> Result<(), Self::Error> {
        self.challenge = Some(challenge);
        Ok(())
    }

    fn generate_authenticate_message(&mut self) -> Result<Vec<u8>, Self::Error> {
        let creds = self.credentials.as_ref()
            .ok_or(EngineError::NoCredentials)?;
        let challenge = self.challenge.as_ref()
            .ok_or(EngineError::NoChallenge)?;

        let response = self.respond(challenge, creds);
        let auth_msg = response.to_message(
            creds,
            &self.workstation,
            self.authenticate_flags(challenge),
        );
        Ok(auth_msg.to_bytes()?)
    }
}

//! Reading and writing the NTLM tokens carried in HTTP authentication headers.


use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use log::trace;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, WWW_AUTHENTICATE};


/// The authentication scheme name used in both directions.
pub const NTLM_SCHEME: &str = "NTLM";


/// The outcome of looking for an NTLM challenge among a response's headers.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ChallengeToken<'a> {
    /// No `WWW-Authenticate` value offers the NTLM scheme.
    Missing,

    /// The NTLM scheme is offered, but without a token.
    Empty,

    /// The (still base64-encoded) challenge token.
    Present(&'a str),
}


/// Encodes an NTLM message as a base64 token.
pub fn encode_token(message: &[u8]) -> String {
    BASE64_STANDARD.encode(message)
}

/// Decodes a base64 token into an NTLM message.
pub fn decode_token(token: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_STANDARD.decode(token)
}

/// Builds the value of an `Authorization` header carrying the given NTLM message.
pub fn authorization_value(message: &[u8]) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::try_from(format!("{} {}", NTLM_SCHEME, encode_token(message)))
}

/// Looks at a single challenge (`scheme [token]`) and returns the token if the scheme is NTLM.
fn ntlm_token_of(challenge: &str) -> Option<&str> {
    let challenge = challenge.trim();
    let (scheme, rest) = match challenge.find(|c: char| c.is_ascii_whitespace()) {
        Some(split) => (&challenge[..split], &challenge[split..]),
        None => (challenge, ""),
    };
    if scheme.eq_ignore_ascii_case(NTLM_SCHEME) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Finds the first NTLM challenge among all `WWW-Authenticate` values.
///
/// Servers commonly offer several schemes, either as separate header lines or joined with commas
/// in one line; the order does not matter.
pub fn find_challenge(headers: &HeaderMap) -> ChallengeToken<'_> {
    for value in headers.get_all(WWW_AUTHENTICATE) {
        let value_str = match value.to_str() {
            Ok(vs) => vs,
            Err(_) => {
                trace!("skipping non-textual WWW-Authenticate value");
                continue;
            },
        };

        for challenge in value_str.split(',') {
            if let Some(token) = ntlm_token_of(challenge) {
                return if token.is_empty() {
                    ChallengeToken::Empty
                } else {
                    ChallengeToken::Present(token)
                };
            }
            trace!("skipping non-NTLM challenge {:?}", challenge.trim());
        }
    }
    ChallengeToken::Missing
}

// Shared test helpers: the server side of the NTLM handshake.
//
// A client library never has to produce Challenge messages or check Authenticate messages, so the
// tests do both by hand.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use md5::Md5;
use ntlmclient::{Credentials, Flags, Message, TargetInfoEntry, TargetInfoType};

/// The server challenge used by all test servers.
pub const SERVER_CHALLENGE: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];

/// The credentials known to the test servers.
pub fn known_credentials() -> Credentials {
    Credentials {
        username: "testuser".to_owned(),
        password: "fish".to_owned(),
        domain: "dt".to_owned(),
    }
}

fn utf16_le(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .flat_map(|w| w.to_le_bytes())
        .collect()
}

/// Assembles an NTLM Challenge (type 2) message for the domain `DT`.
pub fn challenge_message(server_challenge: [u8; 8]) -> Vec<u8> {
    let flags
        = Flags::NEGOTIATE_UNICODE
        | Flags::REQUEST_TARGET
        | Flags::NEGOTIATE_NTLM
        | Flags::NEGOTIATE_ALWAYS_SIGN
        | Flags::TARGET_TYPE_DOMAIN
        | Flags::NEGOTIATE_NTLM2_KEY
        | Flags::NEGOTIATE_TARGET_INFO
        | Flags::NEGOTIATE_128BIT
        | Flags::NEGOTIATE_56BIT
        ;
    let target_name = utf16_le("DT");
    let mut target_info = TargetInfoEntry::from_string(TargetInfoType::NtDomain, "DT").to_bytes();
    target_info.extend(TargetInfoEntry::from_string(TargetInfoType::NtServer, "SERVER").to_bytes());
    target_info.extend(TargetInfoEntry { entry_type: TargetInfoType::Terminator, data: Vec::new() }.to_bytes());

    let header_len: u32 = 56;
    let target_info_offset = header_len + target_name.len() as u32;

    let mut ret = Vec::new();
    ret.extend_from_slice(b"NTLMSSP\0");
    ret.extend_from_slice(&2u32.to_le_bytes());
    ret.extend_from_slice(&(target_name.len() as u16).to_le_bytes());
    ret.extend_from_slice(&(target_name.len() as u16).to_le_bytes());
    ret.extend_from_slice(&header_len.to_le_bytes());
    ret.extend_from_slice(&flags.bits().to_le_bytes());
    ret.extend_from_slice(&server_challenge);
    ret.extend_from_slice(&[0u8; 8]); // context
    ret.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    ret.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    ret.extend_from_slice(&target_info_offset.to_le_bytes());
    ret.extend_from_slice(&[0u8; 8]); // version
    ret.extend_from_slice(&target_name);
    ret.extend_from_slice(&target_info);
    ret
}

/// The `WWW-Authenticate` value carrying [`challenge_message`].
pub fn challenge_header(server_challenge: [u8; 8]) -> String {
    format!("NTLM {}", BASE64_STANDARD.encode(challenge_message(server_challenge)))
}

/// Decodes the NTLM message type of an `Authorization: NTLM ...` value.
#[allow(dead_code)] // not every test file inspects message types
pub fn message_type(authorization: &str) -> Option<u32> {
    let token = authorization.strip_prefix("NTLM ")?;
    let bytes = BASE64_STANDARD.decode(token).ok()?;
    if bytes.len() < 12 || &bytes[0..8] != b"NTLMSSP\0" {
        return None;
    }
    Some(u32::from_le_bytes(bytes[8..12].try_into().unwrap()))
}

/// Checks an `Authorization: NTLM ...` value as a server would: the Authenticate message must
/// name the expected user and carry a valid NTLMv2 proof for the given challenge.
#[allow(dead_code)] // not every test file verifies proofs
pub fn verify_authenticate(authorization: &str, server_challenge: [u8; 8], creds: &Credentials) -> bool {
    let token = match authorization.strip_prefix("NTLM ") {
        Some(t) => t,
        None => return false,
    };
    let bytes = match BASE64_STANDARD.decode(token) {
        Ok(b) => b,
        Err(_) => return false,
    };
    let auth = match Message::try_from(bytes.as_slice()) {
        Ok(Message::Authenticate(a)) => a,
        _ => return false,
    };
    if !auth.user_name.eq_ignore_ascii_case(&creds.username) || auth.domain_name != creds.domain {
        return false;
    }
    if auth.ntlm_response.len() <= 16 {
        return false;
    }

    let (nt_proof, blob) = auth.ntlm_response.split_at(16);
    let ntlm_key = ntlmclient::ntlm_v2_password_func(creds);
    let mut hmac_md5: Hmac<Md5> = <Hmac<Md5> as Mac>::new_from_slice(&ntlm_key).unwrap();
    hmac_md5.update(&server_challenge);
    hmac_md5.update(blob);
    hmac_md5.verify_slice(nt_proof).is_ok()
}

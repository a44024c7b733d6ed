//! The fixed NTLM Negotiate message sent with every probe request.


use ntlmclient::Flags;


const NTLMSSP_MAGIC: [u8; 8] = *b"NTLMSSP\0";
const NEGOTIATE_MESSAGE_TYPE: u32 = 0x0000_0001;

/// Total length of the Negotiate message; there is no payload after the version block.
pub const NEGOTIATE_MESSAGE_LENGTH: usize = 40;


/// The capabilities announced in the Negotiate message.
pub fn negotiate_flags() -> Flags {
    Flags::NEGOTIATE_UNICODE
    | Flags::NEGOTIATE_OEM
    | Flags::REQUEST_TARGET
    | Flags::NEGOTIATE_NTLM
    | Flags::NEGOTIATE_ALWAYS_SIGN
    | Flags::NEGOTIATE_NTLM2_KEY
    | Flags::NEGOTIATE_VERSION
    | Flags::NEGOTIATE_128BIT
    | Flags::NEGOTIATE_KEY_EXCHANGE
    | Flags::NEGOTIATE_56BIT
}

/// Generates the NTLM Negotiate (type 1) message.
///
/// The message carries neither a domain nor a workstation name and ends with a version block
/// claiming Windows 6.1 build 7601, NTLM revision 15. Its content never changes, so it does not
/// depend on any session.
pub fn negotiate_message() -> [u8; NEGOTIATE_MESSAGE_LENGTH] {
    let mut ret = Vec::with_capacity(NEGOTIATE_MESSAGE_LENGTH);
    ret.extend_from_slice(&NTLMSSP_MAGIC);
    ret.extend_from_slice(&NEGOTIATE_MESSAGE_TYPE.to_le_bytes());
    ret.extend_from_slice(&negotiate_flags().bits().to_le_bytes());

    // supplied domain: empty, no offset
    ret.extend_from_slice(&0u16.to_le_bytes()); // length
    ret.extend_from_slice(&0u16.to_le_bytes()); // capacity
    ret.extend_from_slice(&0u32.to_le_bytes()); // offset

    // supplied workstation: empty, pointing at the end of the message
    ret.extend_from_slice(&0u16.to_le_bytes());
    ret.extend_from_slice(&0u16.to_le_bytes());
    ret.extend_from_slice(&(NEGOTIATE_MESSAGE_LENGTH as u32).to_le_bytes());

    // version
    ret.push(6); // major
    ret.push(1); // minor
    ret.extend_from_slice(&7601u16.to_le_bytes()); // build
    ret.extend_from_slice(&[0, 0, 0]); // reserved
    ret.push(15); // NTLM revision

    let mut message = [0u8; NEGOTIATE_MESSAGE_LENGTH];
    message.copy_from_slice(&ret);
    message
}

//! Identifier helpers.
//!
//! Identifiers are stable, globally unique 32-character lowercase hex
//! strings, with a single reserved sentinel: `"0"` names the well-known
//! root record and is never treated as a reference to another entity.

/// Sentinel identifier of the well-known root record.
pub const ROOT_UID: &str = "0";

/// Expected length of a regular identifier.
pub const UID_LEN: usize = 32;

/// Check whether `s` has the shape of a regular identifier.
///
/// The sentinel `"0"` is not identifier-shaped; callers that accept it
/// must check for [`ROOT_UID`] explicitly.
pub fn is_uid_shaped(s: &str) -> bool {
    s.len() == UID_LEN
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

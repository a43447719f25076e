//! Derived identifiers and the recipient hash.
//!
//! Badge, team and series ids are derived from display names unless the
//! caller supplies one. Assertion and invitation ids are random.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Characters stripped from a name when deriving an id.
const ID_BLACKLIST: [char; 7] = ['"', '\'', '(', ')', '*', '&', '?'];

/// Convert a display name into an id: lowercase, spaces become hyphens, and
/// the characters in [`ID_BLACKLIST`] are removed.
pub fn convert_name_to_id(name: &str) -> String {
  name
    .to_lowercase()
    .chars()
    .filter(|c| !ID_BLACKLIST.contains(c))
    .map(|c| if c == ' ' { '-' } else { c })
    .collect()
}

/// The nickname given to a person who did not pick one: the local part of
/// their email address.
pub fn default_nickname(email: &str) -> String {
  email
    .split_once('@')
    .map_or(email, |(local, _)| local)
    .to_owned()
}

/// A fresh random salt for an assertion's recipient hash.
pub fn new_salt() -> String { Uuid::new_v4().to_string() }

/// A fresh 32-character hex invitation token.
pub fn new_invitation_id() -> String { Uuid::new_v4().simple().to_string() }

/// Hex-encoded `sha256(email ‖ salt)`.
pub fn recipient_hash(email: &str, salt: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(email.as_bytes());
  hasher.update(salt.as_bytes());
  hex::encode(hasher.finalize())
}

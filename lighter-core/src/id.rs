//! Document identifier helpers.
//!
//! Document stores such as Firestore reject IDs that start with a digit, so every ID produced
//! here starts with the [`ID_PREFIX`] and every ID accepted by the store facade is checked
//! with [`is_valid_id`].

use uuid::Uuid;

/// Alphabetic prefix shared by generated and derived IDs.
pub const ID_PREFIX: &str = "tid";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Generates a fresh, globally unique document ID (`tid-<uuid v4>`).
pub fn generate_id() -> String {
    format!("{}-{}", ID_PREFIX, Uuid::new_v4())
}

/// Derives a deterministic document ID from `seed`.
///
/// The seed is hashed with 32-bit FNV-1a, so distinct seeds may collide.
pub fn derive_id(seed: &str) -> String {
    format!("{}{}", ID_PREFIX, fnv1a_32(seed.as_bytes()))
}

/// Returns `true` if `value` is non-empty and starts with an ASCII letter.
pub fn is_valid_id(value: &str) -> bool {
    value
        .as_bytes()
        .first()
        .is_some_and(|first| first.is_ascii_alphabetic())
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

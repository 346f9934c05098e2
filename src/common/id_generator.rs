// src/common/id_generator.rs
//! User ids: `U_` followed by eight Crockford Base32 characters

use rand::Rng;

/// Crockford Base32 alphabet (no I, L, O or U)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const USER_PREFIX: &str = "U_";
const ID_LENGTH: usize = 8;

/// New random user id, e.g. `U_K7NP3XQ2`. Collisions surface as a primary
/// key violation on insert.
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(USER_PREFIX.len() + ID_LENGTH);
    id.push_str(USER_PREFIX);
    id.extend(
        (0..ID_LENGTH).map(|_| CROCKFORD_ALPHABET[rng.gen_range(0..CROCKFORD_ALPHABET.len())] as char),
    );
    id
}

//! Storage-key allocation for parsers.
//!
//! Keys are opaque, unordered strings. 128 bits of entropy makes collisions within
//! one message's parser set negligible, so callers never retry; handing out a key
//! that already exists is a programming-invariant violation, not a user error.

use uuid::Uuid;

/// Allocate a fresh parser storage key (32 lowercase hex chars).
pub fn allocate() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_opaque_hex() {
        let key = allocate();
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn keys_do_not_repeat() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(allocate()));
        }
    }
}

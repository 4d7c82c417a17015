use rand::Rng;

pub const REFERENCE_LENGTH: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Opaque 6-character booking reference. Uniqueness is enforced by the
/// bookings table; callers regenerate on conflict.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERENCE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_six_uppercase_alphanumerics() {
        for _ in 0..100 {
            let reference = generate();
            assert_eq!(reference.len(), REFERENCE_LENGTH);
            assert!(reference
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}

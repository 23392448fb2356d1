use blake3::Hasher;

/// Length (in hex characters) of generated pair identifiers.
pub const PAIR_ID_HEX_LEN: usize = 32;

/// Derives a stable identifier for a want/offer pair.
///
/// Each field is prefixed with its byte length, so no field content can move
/// a boundary. The texts are hashed as given; callers that want
/// normalization-insensitive ids should normalize first.
pub fn pair_id(text1: &str, text2: &str, category1: &str, category2: &str) -> String {
    let mut hasher = Hasher::new();
    for part in [text1, text2, category1, category2] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }

    let hash = hasher.finalize();
    let mut id = hash.to_hex().to_string();
    id.truncate(PAIR_ID_HEX_LEN);
    id
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for feature hashing, where a rare collision only merges two
/// vocabulary buckets.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Maps a token to a bucket in `[0, buckets)`.
#[inline]
pub fn token_bucket(token: &str, buckets: usize) -> usize {
    if buckets == 0 {
        return 0;
    }
    (hash_to_u64(token.as_bytes()) % buckets as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pair_id_determinism() {
        let a = pair_id("велосипед", "самокат", "спорт", "спорт");
        let b = pair_id("велосипед", "самокат", "спорт", "спорт");
        assert_eq!(a, b);
        assert_eq!(a.len(), PAIR_ID_HEX_LEN);
    }

    #[test]
    fn test_pair_id_field_boundaries() {
        let a = pair_id("ab", "c", "x", "y");
        let b = pair_id("a", "bc", "x", "y");
        assert_ne!(a, b);
    }

    #[test]
    fn test_pair_id_delimiter_in_text() {
        let a = pair_id("велосипед|горный", "самокат", "спорт", "спорт");
        let b = pair_id("велосипед", "горный|самокат", "спорт", "спорт");
        assert_ne!(a, b);

        let c = pair_id("диван", "кресло", "мебель|", "мебель");
        let d = pair_id("диван", "кресло", "мебель", "|мебель");
        assert_ne!(c, d);
    }

    #[test]
    fn test_pair_id_is_order_sensitive() {
        let forward = pair_id("диван", "кресло", "мебель", "мебель");
        let reverse = pair_id("кресло", "диван", "мебель", "мебель");
        assert_ne!(forward, reverse);
    }

    #[test]
    fn test_hash_to_u64_uniqueness() {
        let inputs = ["ноутбук", "ноутбуки", "телефон", "Ноутбук"];
        let hashes: HashSet<_> = inputs.iter().map(|i| hash_to_u64(i.as_bytes())).collect();
        assert_eq!(hashes.len(), inputs.len());
    }

    #[test]
    fn test_token_bucket_range() {
        for token in ["a", "b", "велосипед", "гитара", ""] {
            assert!(token_bucket(token, 17) < 17);
        }
        assert_eq!(token_bucket("anything", 0), 0);
    }
}

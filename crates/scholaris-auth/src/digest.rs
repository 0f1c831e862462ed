use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Stable identifier for the client device, derived from its user agent.
pub fn device_fingerprint(user_agent: &str) -> String {
    sha256_hex(user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        assert_eq!(device_fingerprint("curl/8.0"), device_fingerprint("curl/8.0"));
        assert_ne!(device_fingerprint("curl/8.0"), device_fingerprint("curl/8.1"));
    }
}

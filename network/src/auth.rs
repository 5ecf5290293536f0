use sha2::{Digest, Sha256};

/// Bearer token both ends derive from the shared credentials.
pub fn auth_token(access_key: &str, secret_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(access_key.as_bytes());
    hasher.update(b":");
    hasher.update(secret_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks an `Authorization` header value against the expected token.
pub fn verify_token(header: &str, access_key: &str, secret_key: &str) -> bool {
    let Some(presented) = header.strip_prefix("Bearer ") else {
        return false;
    };
    let expected = auth_token(access_key, secret_key);

    // Constant time in the token length.
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

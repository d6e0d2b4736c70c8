//! HMAC-SHA256 webhook signatures over `"{timestamp}.{body}"`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex signature a sender attaches as `x-signature`.
#[must_use]
pub fn sign(body: &str, timestamp: &str, secret: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    let digest = mac.finalize().into_bytes();
    digest.iter().fold(String::with_capacity(64), |mut s, b| {
        use std::fmt::Write;
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Check `signature` against the expected HMAC of `timestamp` and `body`.
///
/// The comparison runs in constant time with respect to the contents; a
/// signature of the wrong length is rejected.
#[must_use]
pub fn verify_signature(body: &str, timestamp: &str, signature: &str, secret: &str) -> bool {
    let expected = sign(body, timestamp, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

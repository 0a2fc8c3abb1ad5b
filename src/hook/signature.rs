//! HMAC signature verification for inbound webhook events.
//!
//! Providers such as GitHub and Stripe sign the raw request body with a
//! shared secret and put the hex-encoded digest in a header, usually with
//! a prefix like `sha256=`. [`verify`] recomputes the digest over the raw
//! body and compares it to the provided header value in constant time.
//! Stateless and side-effect-free; safe to call from any handler.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::config::model::SignatureSpec;

/// Check `provided` against the HMAC of `body` under the route's secret.
///
/// Fails closed: an empty provided signature is always rejected. The
/// digest algorithm is taken from the spec's `alg`, defaulting to
/// SHA-256 for anything that is not explicitly `sha1`.
#[must_use]
pub fn verify(spec: &SignatureSpec, body: &[u8], provided: &str) -> bool {
    if provided.is_empty() {
        return false;
    }

    let secret = std::env::var(&spec.secret_from_env).unwrap_or_default();

    let digest = if spec.alg.eq_ignore_ascii_case("sha1") {
        hmac_hex::<Hmac<Sha1>>(secret.as_bytes(), body)
    } else {
        hmac_hex::<Hmac<Sha256>>(secret.as_bytes(), body)
    };
    let Some(digest) = digest else {
        return false;
    };

    let expected = format!("{}{digest}", spec.prefix);
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

fn hmac_hex<M: Mac + KeyInit>(secret: &[u8], message: &[u8]) -> Option<String> {
    let mut mac = <M as Mac>::new_from_slice(secret).ok()?;
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison to avoid leaking match length via latency.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(alg: &str, prefix: &str, env: &str) -> SignatureSpec {
        SignatureSpec {
            header_name: "x-signature".into(),
            alg: alg.into(),
            prefix: prefix.into(),
            secret_from_env: env.into(),
        }
    }

    fn sign_sha256(secret: &str, body: &[u8]) -> String {
        hmac_hex::<Hmac<Sha256>>(secret.as_bytes(), body).unwrap()
    }

    #[test]
    fn valid_sha256_signature_accepted() {
        std::env::set_var("HOOKFAN_SIG_TEST_1", "s3cret");
        let spec = spec("", "sha256=", "HOOKFAN_SIG_TEST_1");
        let body = br#"{"something":"some"}"#;
        let provided = format!("sha256={}", sign_sha256("s3cret", body));
        assert!(verify(&spec, body, &provided));
    }

    #[test]
    fn empty_signature_rejected() {
        std::env::set_var("HOOKFAN_SIG_TEST_2", "s3cret");
        let spec = spec("", "", "HOOKFAN_SIG_TEST_2");
        assert!(!verify(&spec, b"payload", ""));
    }

    #[test]
    fn tampered_body_rejected() {
        std::env::set_var("HOOKFAN_SIG_TEST_3", "s3cret");
        let spec = spec("", "", "HOOKFAN_SIG_TEST_3");
        let provided = sign_sha256("s3cret", b"payload");
        assert!(verify(&spec, b"payload", &provided));
        assert!(!verify(&spec, b"payloae", &provided));
    }

    #[test]
    fn digest_is_deterministic() {
        let a = sign_sha256("key", b"same bytes");
        let b = sign_sha256("key", b"same bytes");
        assert_eq!(a, b);
        assert_ne!(a, sign_sha256("key", b"same byteS"));
    }

    #[test]
    fn missing_prefix_rejected() {
        std::env::set_var("HOOKFAN_SIG_TEST_4", "s3cret");
        let spec = spec("", "sha256=", "HOOKFAN_SIG_TEST_4");
        let bare = sign_sha256("s3cret", b"payload");
        assert!(!verify(&spec, b"payload", &bare));
    }

    #[test]
    fn sha1_alg_selects_sha1_digest() {
        std::env::set_var("HOOKFAN_SIG_TEST_5", "s3cret");
        let sha1_spec = spec("sha1", "", "HOOKFAN_SIG_TEST_5");
        let provided = hmac_hex::<Hmac<Sha1>>(b"s3cret", b"payload").unwrap();
        assert!(verify(&sha1_spec, b"payload", &provided));

        // The same signature must not pass under the default sha256.
        let sha256_spec = spec("", "", "HOOKFAN_SIG_TEST_5");
        assert!(!verify(&sha256_spec, b"payload", &provided));
    }

    #[test]
    fn alg_is_case_insensitive() {
        std::env::set_var("HOOKFAN_SIG_TEST_6", "s3cret");
        let spec = spec("SHA1", "", "HOOKFAN_SIG_TEST_6");
        let provided = hmac_hex::<Hmac<Sha1>>(b"s3cret", b"payload").unwrap();
        assert!(verify(&spec, b"payload", &provided));
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}

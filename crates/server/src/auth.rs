//! Request authentication: shared-secret headers and Twilio webhook
//! signature validation. Absent configuration disables the corresponding
//! check — convenient for local dev, never the case in a real deployment.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Not from the `subtle` crate — a small XOR-accumulate comparison is
/// enough here and keeps the dependency list aligned with the rest of the
/// stack.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// `None` configured secret disables the check entirely (local dev).
pub fn check_shared_secret(configured: Option<&str>, provided: Option<&str>) -> bool {
    match configured {
        None => true,
        Some(secret) => match provided {
            Some(value) => constant_time_eq(secret.as_bytes(), value.as_bytes()),
            None => false,
        },
    }
}

/// HMAC-SHA1 over `url + concat(sorted(key+value))` of the form body,
/// base64-encoded, compared constant-time against the provider's signature
/// header.
pub fn validate_twilio_signature(
    auth_token: &str,
    url: &str,
    form_params: &[(String, String)],
    signature_b64: &str,
) -> bool {
    let mut sorted = form_params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut data = String::from(url);
    for (key, value) in &sorted {
        data.push_str(key);
        data.push_str(value);
    }

    let Ok(mut mac) = HmacSha1::new_from_slice(auth_token.as_bytes()) else {
        return false;
    };
    mac.update(data.as_bytes());
    let computed = BASE64.encode(mac.finalize().into_bytes());

    constant_time_eq(computed.as_bytes(), signature_b64.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_secret_disabled_when_unconfigured() {
        assert!(check_shared_secret(None, None));
        assert!(check_shared_secret(None, Some("anything")));
    }

    #[test]
    fn shared_secret_requires_exact_match() {
        assert!(check_shared_secret(Some("s3cr3t"), Some("s3cr3t")));
        assert!(!check_shared_secret(Some("s3cr3t"), Some("wrong")));
        assert!(!check_shared_secret(Some("s3cr3t"), None));
    }

    #[test]
    fn twilio_signature_matches_reference_vector() {
        // Reference vector from Twilio's own signature documentation.
        let auth_token = "12345";
        let url = "https://mycompany.com/myapp.php?foo=1&bar=2";
        let params = vec![
            ("Digits".to_string(), "1234".to_string()),
            ("To".to_string(), "+18005551212".to_string()),
            ("From".to_string(), "+14158675310".to_string()),
            ("Caller".to_string(), "+14158675310".to_string()),
            ("CallSid".to_string(), "CA1234567890ABCDE".to_string()),
        ];
        let expected_signature = "RSOYDt4RCzwt2vt4yyMVgR69xDc=";

        assert!(validate_twilio_signature(
            auth_token,
            url,
            &params,
            expected_signature
        ));
    }

    #[test]
    fn twilio_signature_rejects_tampered_body() {
        let auth_token = "12345";
        let url = "https://mycompany.com/myapp.php?foo=1&bar=2";
        let params = vec![("Digits".to_string(), "9999".to_string())];
        assert!(!validate_twilio_signature(
            auth_token,
            url,
            &params,
            "RSOYDt4RCzwt2vt4yyMVgR69xDc="
        ));
    }
}

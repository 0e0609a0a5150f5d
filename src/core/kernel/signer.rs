use crate::core::errors::CloudError;
use crate::core::types::ParameterSet;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha1::Sha1;
use url::form_urlencoded;

type HmacSha1 = Hmac<Sha1>;

/// Signer trait for request authentication
///
/// Implementations turn the full parameter set of a request (including the
/// injected `apikey`, `command` and `response` keys, excluding `signature`)
/// into the value sent as the `signature` query parameter.
pub trait Signer: Send + Sync {
    fn sign(&self, params: &ParameterSet) -> Result<String, CloudError>;
}

/// HMAC-SHA1 signer over the canonical parameter string.
pub struct HmacSha1Signer {
    secret_key: Secret<String>,
}

impl HmacSha1Signer {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key: Secret::new(secret_key),
        }
    }
}

impl std::fmt::Debug for HmacSha1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha1Signer").finish_non_exhaustive()
    }
}

impl Signer for HmacSha1Signer {
    fn sign(&self, params: &ParameterSet) -> Result<String, CloudError> {
        sign(params, self.secret_key.expose_secret())
    }
}

/// Form-encode a single value: spaces become `+`, only ASCII alphanumerics
/// and `*-._` are left as is.
pub fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Build the exact string that gets signed.
///
/// Keys are lower-cased and sorted, values form-encoded, pairs joined with
/// `&`, and then the whole string is lower-cased. The server computes the
/// same string independently, so the final lower-casing of values is
/// load-bearing.
pub fn canonical_string(params: &ParameterSet) -> Result<String, CloudError> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        if key.is_empty() {
            return Err(CloudError::Signing("empty parameter name".to_string()));
        }
        if key.contains(['=', '&']) {
            return Err(CloudError::Signing(format!(
                "parameter name '{}' cannot be represented in a query string",
                key
            )));
        }
        pairs.push((key.to_lowercase(), encode_value(value)));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(pair) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(CloudError::Signing(format!(
            "parameter '{}' is given more than once with different case",
            pair[0].0
        )));
    }

    Ok(pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
        .to_lowercase())
}

/// Base64 of HMAC-SHA1(secret_key, canonical_string(params)).
pub fn sign(params: &ParameterSet, secret_key: &str) -> Result<String, CloudError> {
    let canonical = canonical_string(params)?;
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())
        .map_err(|e| CloudError::Signing(format!("Invalid secret key: {}", e)))?;
    mac.update(canonical.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_networks() -> ParameterSet {
        ParameterSet::from([
            ("command", "listNetworks"),
            ("zoneid", "5"),
            ("apikey", "k"),
            ("response", "json"),
        ])
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(
            canonical_string(&list_networks()).unwrap(),
            "apikey=k&command=listnetworks&response=json&zoneid=5"
        );
    }

    #[test]
    fn test_known_signature() {
        assert_eq!(
            sign(&list_networks(), "s").unwrap(),
            "tCXhACyX1S7Z2qRz86viZRbO8y8="
        );
    }

    #[test]
    fn test_spaces_and_mixed_case_values() {
        let params = ParameterSet::from([
            ("command", "deployVirtualMachine"),
            ("displayName", "Web Server 01"),
            (
                "apiKey",
                "plgWJfZK4gyS3mOMTVmjUVg-X-jlWlnfaUJ9GAbBbf9EdM-kAYMmAiLqzzq1ElZLYq_u38zCm0bewzGUdP66mg",
            ),
            ("response", "json"),
        ]);
        let canonical = canonical_string(&params).unwrap();
        assert!(canonical.contains("displayname=web+server+01"));
        assert_eq!(
            sign(
                &params,
                "VDaACYb0LV9eNjTetIOElcVQkvJck_J_QljX_FcHRj87ZKiy0z0ty0ZsYBkoXkY9b7eq1EhwJaw7FF3akA3KBQ"
            )
            .unwrap(),
            "5yGWAR2qf5lSqOAP7sxVfbelhDo="
        );
    }

    #[test]
    fn test_key_case_and_order_do_not_matter() {
        let a = ParameterSet::from([("ZoneId", "5"), ("Command", "listNetworks")]);
        let b = ParameterSet::from([("command", "listNetworks"), ("zoneid", "5")]);
        assert_eq!(sign(&a, "secret").unwrap(), sign(&b, "secret").unwrap());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let params = list_networks();
        assert_eq!(sign(&params, "s").unwrap(), sign(&params, "s").unwrap());
    }

    #[test]
    fn test_value_change_changes_signature() {
        let original = list_networks();
        let changed = list_networks().with("zoneid", "6");
        assert_ne!(sign(&original, "s").unwrap(), sign(&changed, "s").unwrap());

        let other_secret = sign(&original, "t").unwrap();
        assert_ne!(sign(&original, "s").unwrap(), other_secret);
    }

    #[test]
    fn test_value_case_is_folded() {
        let upper = ParameterSet::from([("name", "WEB")]);
        let lower = ParameterSet::from([("name", "web")]);
        assert_eq!(sign(&upper, "s").unwrap(), sign(&lower, "s").unwrap());
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        assert_eq!(encode_value("a b&c=d/e"), "a+b%26c%3Dd%2Fe");
        assert_eq!(encode_value("x*y-z._"), "x*y-z._");
        assert_eq!(encode_value("ü"), "%C3%BC");
    }

    #[test]
    fn test_unrepresentable_keys_are_rejected() {
        let empty = ParameterSet::from([("", "x")]);
        assert!(matches!(sign(&empty, "s"), Err(CloudError::Signing(_))));

        let ampersand = ParameterSet::from([("a&b", "x")]);
        assert!(matches!(sign(&ampersand, "s"), Err(CloudError::Signing(_))));

        let duplicate = ParameterSet::from([("zoneid", "1"), ("ZONEID", "2")]);
        assert!(matches!(sign(&duplicate, "s"), Err(CloudError::Signing(_))));
    }

    #[test]
    fn test_signer_trait_matches_free_function() {
        let signer = HmacSha1Signer::new("s".to_string());
        assert_eq!(
            signer.sign(&list_networks()).unwrap(),
            sign(&list_networks(), "s").unwrap()
        );
    }
}

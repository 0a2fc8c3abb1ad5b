//! Serde data structures for the Hookfan configuration file.
//!
//! Contains [`Config`] (the root), [`Webhook`], [`SignatureSpec`],
//! [`ResponseSpec`], and [`Header`]. All types derive `Serialize` and
//! `Deserialize` with `deny_unknown_fields` for strict parsing. Field
//! names follow the camelCase wire format (`headerName`, `secretFromEnv`).

use serde::{Deserialize, Serialize};

const fn default_response_code() -> u16 {
    204
}

fn is_default_response_code(v: &u16) -> bool {
    *v == default_response_code()
}

fn is_default_response(v: &ResponseSpec) -> bool {
    v.headers.is_empty() && v.body.is_empty() && is_default_response_code(&v.code)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub webhooks: Vec<Webhook>,
}

impl Config {
    #[must_use]
    pub fn total_targets(&self) -> usize {
        self.webhooks.iter().map(|wh| wh.targets.len()).sum()
    }
}

/// One configured route: an inbound path plus its forwarding targets
/// and the synthetic response returned to the sender.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Webhook {
    pub path: String,

    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureSpec>,

    #[serde(default, skip_serializing_if = "is_default_response")]
    pub response: ResponseSpec,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

/// HMAC signature verification settings for one webhook.
///
/// `alg` selects the digest: empty or `sha256` (default) or `sha1`.
/// The secret is never stored in the config file, only the name of the
/// environment variable holding it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SignatureSpec {
    pub header_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alg: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    pub secret_from_env: String,
}

/// The synthetic reply sent to the original caller, independent of any
/// forward's outcome.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,

    #[serde(
        default = "default_response_code",
        skip_serializing_if = "is_default_response_code"
    )]
    pub code: u16,
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            body: String::new(),
            code: default_response_code(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Header {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_from_env: String,
}

impl Header {
    /// Literal value when set, otherwise the named environment variable.
    #[must_use]
    pub fn resolve(&self) -> String {
        if self.value.is_empty() {
            std::env::var(&self.value_from_env).unwrap_or_default()
        } else {
            self.value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_code_defaults_to_204() {
        let wh: Webhook = serde_yml::from_str(
            "path: /wh\nmethod: POST\ntargets: [\"http://localhost:9000\"]\n",
        )
        .unwrap();
        assert_eq!(wh.response.code, 204);
        assert!(wh.response.body.is_empty());
        assert!(wh.signature.is_none());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<Webhook, _> =
            serde_yml::from_str("path: /wh\nmethod: POST\nretries: 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn header_resolves_literal_over_env() {
        let header = Header {
            name: "x-test".into(),
            value: "literal".into(),
            value_from_env: "HOOKFAN_TEST_UNUSED".into(),
        };
        assert_eq!(header.resolve(), "literal");
    }

    #[test]
    fn header_resolves_from_env() {
        std::env::set_var("HOOKFAN_TEST_HEADER_VALUE", "from-env");
        let header = Header {
            name: "x-test".into(),
            value: String::new(),
            value_from_env: "HOOKFAN_TEST_HEADER_VALUE".into(),
        };
        assert_eq!(header.resolve(), "from-env");
    }

    #[test]
    fn missing_env_resolves_empty() {
        let header = Header {
            name: "x-test".into(),
            value: String::new(),
            value_from_env: "HOOKFAN_TEST_HEADER_MISSING".into(),
        };
        assert_eq!(header.resolve(), "");
    }

    #[test]
    fn signature_spec_camel_case_fields() {
        let spec: SignatureSpec = serde_yml::from_str(
            "headerName: x-hub-signature-256\nalg: sha256\nprefix: \"sha256=\"\nsecretFromEnv: WEBHOOK_SECRET\n",
        )
        .unwrap();
        assert_eq!(spec.header_name, "x-hub-signature-256");
        assert_eq!(spec.secret_from_env, "WEBHOOK_SECRET");
        assert_eq!(spec.prefix, "sha256=");
    }
}

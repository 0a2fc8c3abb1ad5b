//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as empty or duplicate paths, unknown HTTP methods,
//! malformed target URLs, incomplete signature blocks, and unresolvable
//! signature secrets. Returns a list of [`ValidationError`] values with
//! per-field suggestions.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

pub const VALID_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

const SUPPORTED_ALGS: &[&str] = &["sha256", "sha1"];

/// Validate a single webhook path. Returns `Ok(())` or a human-readable error.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err(format!("path must start with '/' (did you mean '/{path}'?)"));
    }
    Ok(())
}

/// Validate a single target URL. Returns `Ok(())` or a human-readable error.
pub fn validate_target_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Validate an HTTP method string. Returns `Ok(())` or a human-readable error.
pub fn validate_method(method: &str) -> Result<(), String> {
    if method.is_empty() {
        return Err("method cannot be empty".into());
    }
    let upper = method.to_uppercase();
    if VALID_METHODS.contains(&upper.as_str()) {
        Ok(())
    } else {
        Err(format!("'{method}' is not a valid HTTP method"))
    }
}

#[allow(clippy::too_many_lines)]
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.webhooks.is_empty() {
        errors.push(ValidationError {
            webhook: "(root)".into(),
            field: "webhooks".into(),
            message: "at least one webhook must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_paths = std::collections::HashSet::new();

    for (i, webhook) in config.webhooks.iter().enumerate() {
        let webhook_id = if webhook.path.is_empty() {
            format!("webhooks[{i}]")
        } else {
            webhook.path.clone()
        };

        if let Err(msg) = validate_path(&webhook.path) {
            errors.push(ValidationError {
                webhook: webhook_id.clone(),
                field: "path".into(),
                message: msg,
                suggestion: if !webhook.path.is_empty() && !webhook.path.starts_with('/') {
                    Some(format!("did you mean '/{}'?", webhook.path))
                } else {
                    None
                },
            });
        }

        if !seen_paths.insert(&webhook.path) {
            errors.push(ValidationError {
                webhook: webhook_id.clone(),
                field: "path".into(),
                message: "duplicate webhook path".into(),
                suggestion: None,
            });
        }

        if let Err(msg) = validate_method(&webhook.method) {
            errors.push(ValidationError {
                webhook: webhook_id.clone(),
                field: "method".into(),
                message: msg,
                suggestion: None,
            });
        }

        if webhook.response.code != 0
            && http::StatusCode::from_u16(webhook.response.code).is_err()
        {
            errors.push(ValidationError {
                webhook: webhook_id.clone(),
                field: "response.code".into(),
                message: format!("'{}' is not a valid HTTP status code", webhook.response.code),
                suggestion: None,
            });
        }

        for target in &webhook.targets {
            if let Err(msg) = validate_target_url(target) {
                errors.push(ValidationError {
                    webhook: webhook_id.clone(),
                    field: "targets".into(),
                    message: msg,
                    suggestion: None,
                });
            }
        }

        if let Some(ref signature) = webhook.signature {
            if signature.header_name.is_empty() {
                errors.push(ValidationError {
                    webhook: webhook_id.clone(),
                    field: "signature.headerName".into(),
                    message: "headerName is required when signature is configured".into(),
                    suggestion: None,
                });
            }

            if !signature.alg.is_empty()
                && !SUPPORTED_ALGS
                    .iter()
                    .any(|alg| signature.alg.eq_ignore_ascii_case(alg))
            {
                errors.push(ValidationError {
                    webhook: webhook_id.clone(),
                    field: "signature.alg".into(),
                    message: format!(
                        "unsupported algorithm '{}' (expected sha256 or sha1)",
                        signature.alg
                    ),
                    suggestion: None,
                });
            }

            if signature.secret_from_env.is_empty() {
                errors.push(ValidationError {
                    webhook: webhook_id.clone(),
                    field: "signature.secretFromEnv".into(),
                    message: "secretFromEnv is required when signature is configured".into(),
                    suggestion: None,
                });
            } else if std::env::var(&signature.secret_from_env)
                .map(|v| v.is_empty())
                .unwrap_or(true)
            {
                errors.push(ValidationError {
                    webhook: webhook_id.clone(),
                    field: "signature.secretFromEnv".into(),
                    message: format!(
                        "environment variable '{}' is not set or empty",
                        signature.secret_from_env
                    ),
                    suggestion: Some("export the secret before starting".into()),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!(
        "  {} webhooks, {} targets\n",
        config.webhooks.len(),
        config.total_targets()
    )];

    for webhook in &config.webhooks {
        lines.push(format!(
            "  {} {}  -> {} targets",
            webhook.method,
            webhook.path,
            webhook.targets.len(),
        ));
        lines.push(format!("    response: {}", webhook.response.code));
        if let Some(ref signature) = webhook.signature {
            let alg = if signature.alg.is_empty() {
                "sha256"
            } else {
                &signature.alg
            };
            lines.push(format!(
                "    signature: {} ({})",
                signature.header_name, alg
            ));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

//! Routing prefix allocation
//!
//! Generates the unique subdomain label that addresses a tenant. The primary
//! algorithm is a zero-padded sequential prefix derived from the current
//! tenant count; collisions (concurrent creation, manual overrides) advance
//! to the next candidate for a bounded number of attempts before falling
//! back to a collision-resistant generated token, trading strict
//! sequentiality for guaranteed termination.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use sea_orm::ConnectionTrait;

use crate::config::PrefixConfig;
use crate::error::ProvisionError;
use crate::repositories::TenantRepository;

// DNS label shape: lowercase alphanumerics and inner hyphens, max 63 chars.
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("prefix regex is valid")
});

/// Allocator for tenant routing prefixes
#[derive(Debug, Clone)]
pub struct UrlPrefixAllocator {
    width: usize,
    max_attempts: u32,
}

impl UrlPrefixAllocator {
    pub fn new(config: &PrefixConfig) -> Self {
        Self {
            width: config.width,
            max_attempts: config.max_attempts,
        }
    }

    /// Allocate a prefix not currently assigned to any tenant.
    pub async fn allocate<C: ConnectionTrait>(&self, db: &C) -> Result<String, ProvisionError> {
        let repo = TenantRepository::new(db);

        let mut candidate_number = repo.count().await? + 1;

        for _ in 0..self.max_attempts {
            let candidate = format!("{:0width$}", candidate_number, width = self.width);
            if !repo.url_prefix_exists(&candidate).await? {
                return Ok(candidate);
            }
            candidate_number += 1;
        }

        // Sequential space is exhausted or heavily contended; the generated
        // token is not re-checked against the table.
        tracing::warn!(
            attempts = self.max_attempts,
            "sequential prefix allocation exhausted, falling back to generated token"
        );
        Ok(fallback_token())
    }

    /// Validate and claim a caller-supplied prefix. Rejects without mutating
    /// any state when the prefix is malformed or already assigned.
    pub async fn claim_custom<C: ConnectionTrait>(
        &self,
        db: &C,
        prefix: &str,
    ) -> Result<String, ProvisionError> {
        validate_prefix(prefix)?;

        let repo = TenantRepository::new(db);
        if repo.url_prefix_exists(prefix).await? {
            return Err(ProvisionError::Conflict {
                resource: "url_prefix",
                value: prefix.to_string(),
            });
        }

        Ok(prefix.to_string())
    }
}

/// Check that a prefix is a well-formed DNS label.
pub fn validate_prefix(prefix: &str) -> Result<(), ProvisionError> {
    if PREFIX_RE.is_match(prefix) {
        Ok(())
    } else {
        Err(ProvisionError::validation(format!(
            "url prefix '{}' must be a lowercase DNS label (a-z, 0-9, inner hyphens, max 63 chars)",
            prefix
        )))
    }
}

/// Time-based token with a random suffix. Collision probability against the
/// sequential namespace and other fallback tokens is astronomically low.
fn fallback_token() -> String {
    use rand::Rng;

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let suffix: String = rand::thread_rng()
        .sample_iter(rand::distributions::Uniform::new_inclusive(b'a', b'z'))
        .take(6)
        .map(char::from)
        .collect();

    format!("t{:x}{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_prefix_accepts_dns_labels() {
        assert!(validate_prefix("0001").is_ok());
        assert!(validate_prefix("acme").is_ok());
        assert!(validate_prefix("acme-corp-2").is_ok());
        assert!(validate_prefix("a").is_ok());
    }

    #[test]
    fn test_validate_prefix_rejects_malformed_labels() {
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("-acme").is_err());
        assert!(validate_prefix("acme-").is_err());
        assert!(validate_prefix("Acme").is_err());
        assert!(validate_prefix("acme corp").is_err());
        assert!(validate_prefix(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_fallback_token_shape() {
        let token = fallback_token();
        assert!(validate_prefix(&token).is_ok());
        assert!(token.starts_with('t'));

        // Two tokens minted back to back must differ in their random suffix
        assert_ne!(fallback_token(), fallback_token());
    }
}

//! Repository configuration.

use crate::error::{CoreError, CoreResult};

/// What a listing does with index entries whose record is absent or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyEntryPolicy {
    /// Leave the entry out of the listing.
    #[default]
    Skip,
    /// Fail the listing with an invalid payload error.
    Reject,
}

/// Configuration for opening a record repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// How many optimistic read-modify-write attempts an index update makes
    /// before giving up. Only used with backends supporting
    /// version-checked writes.
    pub index_retry_limit: u32,

    /// Listing behaviour for absent or zero-length records.
    pub empty_entries: EmptyEntryPolicy,

    /// Prefix that marks reserved keys. Every index key must carry it and no
    /// record identifier may.
    pub reserved_prefix: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            index_retry_limit: 16,
            empty_entries: EmptyEntryPolicy::Skip,
            reserved_prefix: "_".to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the index retry limit.
    #[must_use]
    pub const fn index_retry_limit(mut self, attempts: u32) -> Self {
        self.index_retry_limit = attempts;
        self
    }

    /// Sets the listing policy for absent or empty records.
    #[must_use]
    pub const fn empty_entries(mut self, policy: EmptyEntryPolicy) -> Self {
        self.empty_entries = policy;
        self
    }

    /// Sets the reserved key prefix.
    #[must_use]
    pub fn reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    /// Checks the configuration for values the repository cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] for a zero retry limit or an
    /// empty reserved prefix.
    pub fn validate(&self) -> CoreResult<()> {
        if self.index_retry_limit == 0 {
            return Err(CoreError::invalid_schema("index retry limit must be at least 1"));
        }
        if self.reserved_prefix.is_empty() {
            return Err(CoreError::invalid_schema("reserved prefix must not be empty"));
        }
        Ok(())
    }

    /// Whether `key` falls in the reserved key space.
    pub fn is_reserved(&self, key: &str) -> bool {
        key.starts_with(&self.reserved_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.index_retry_limit, 16);
        assert_eq!(config.empty_entries, EmptyEntryPolicy::Skip);
        assert_eq!(config.reserved_prefix, "_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = RepositoryConfig::new()
            .index_retry_limit(3)
            .empty_entries(EmptyEntryPolicy::Reject)
            .reserved_prefix("$");

        assert_eq!(config.index_retry_limit, 3);
        assert_eq!(config.empty_entries, EmptyEntryPolicy::Reject);
        assert!(config.is_reserved("$loads"));
        assert!(!config.is_reserved("_loads"));
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(RepositoryConfig::new().index_retry_limit(0).validate().is_err());
        assert!(RepositoryConfig::new().reserved_prefix("").validate().is_err());
    }
}

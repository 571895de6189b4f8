//! Tenant keys
//!
//! A [`TenantKey`] selects the aggregate a request is accounted against.
//! It has one part (a provider such as `AWS_METRICS`) or two ordered parts
//! (a container and a scope). Keys compare part by part and are immutable
//! once built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AWS_PROVIDER_KEY, AZURE_PROVIDER_KEY, DEFAULT_TENANT_PART, MAX_TENANT_KEY_PARTS,
    NAME_SEPARATOR,
};
use crate::errors::{BlobMeterError, Result};

/// Composite identifier of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TenantKey {
    primary: String,
    secondary: Option<String>,
}

impl TenantKey {
    /// Build a single-part key.
    pub fn new(primary: impl Into<String>) -> Result<Self> {
        let primary = validate_part(primary.into())?;
        Ok(Self { primary, secondary: None })
    }

    /// Build a two-part key such as `container.scope`.
    pub fn pair(primary: impl Into<String>, secondary: impl Into<String>) -> Result<Self> {
        let primary = validate_part(primary.into())?;
        let secondary = validate_part(secondary.into())?;
        Ok(Self { primary, secondary: Some(secondary) })
    }

    /// Build a key from one or two parts.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Result<Self> {
        match parts {
            [primary] => Self::new(primary.as_ref()),
            [primary, secondary] => Self::pair(primary.as_ref(), secondary.as_ref()),
            _ => Err(BlobMeterError::InvalidTenantKey(format!(
                "expected 1 to {MAX_TENANT_KEY_PARTS} parts, got {}",
                parts.len()
            ))),
        }
    }

    /// The well-known key used by single-tenant callers: `DEFAULT.DEFAULT`.
    pub fn default_key() -> Self {
        Self {
            primary: DEFAULT_TENANT_PART.to_string(),
            secondary: Some(DEFAULT_TENANT_PART.to_string()),
        }
    }

    /// Aggregate key for the AWS provider.
    pub fn aws() -> Self {
        Self { primary: AWS_PROVIDER_KEY.to_string(), secondary: None }
    }

    /// Aggregate key for the Azure provider.
    pub fn azure() -> Self {
        Self { primary: AZURE_PROVIDER_KEY.to_string(), secondary: None }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// Parts in order.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.secondary.as_deref())
    }

    /// Number of parts (1 or 2).
    pub fn len(&self) -> usize {
        if self.secondary.is_some() {
            2
        } else {
            1
        }
    }

    /// Always false; a key has at least one part.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for TenantKey {
    fn default() -> Self {
        Self::default_key()
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)?;
        if let Some(secondary) = &self.secondary {
            write!(f, "{NAME_SEPARATOR}{secondary}")?;
        }
        Ok(())
    }
}

impl FromStr for TenantKey {
    type Err = BlobMeterError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(NAME_SEPARATOR).collect();
        Self::from_parts(&parts)
    }
}

impl TryFrom<Vec<String>> for TenantKey {
    type Error = BlobMeterError;

    fn try_from(parts: Vec<String>) -> Result<Self> {
        Self::from_parts(&parts)
    }
}

impl From<TenantKey> for Vec<String> {
    fn from(key: TenantKey) -> Self {
        let mut parts = vec![key.primary];
        parts.extend(key.secondary);
        parts
    }
}

fn validate_part(part: String) -> Result<String> {
    if part.is_empty() {
        return Err(BlobMeterError::InvalidTenantKey("key parts must not be empty".into()));
    }
    if part.contains(NAME_SEPARATOR) {
        return Err(BlobMeterError::InvalidTenantKey(format!(
            "key part '{part}' must not contain '{NAME_SEPARATOR}'"
        )));
    }
    Ok(part)
}

use crate::domain::errors::ValidationError;

/// A validated bucket name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    /// Create a new BucketName with S3-compatible validation rules
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        // Length validation
        if value.len() < 3 {
            return Err(ValidationError::BucketNameTooShort {
                actual: value.len(),
                min: 3,
            });
        }

        if value.len() > 63 {
            return Err(ValidationError::BucketNameTooLong {
                actual: value.len(),
                max: 63,
            });
        }

        // Must start and end with lowercase letter or number
        if !value
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::BucketNameInvalidStart);
        }

        if !value
            .chars()
            .last()
            .map_or(false, |c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::BucketNameInvalidEnd);
        }

        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.' {
                return Err(ValidationError::BucketNameInvalidCharacter(c));
            }
        }

        if value.contains("..") || value.contains(".-") || value.contains("-.") {
            return Err(ValidationError::BucketNameAdjacentSeparators);
        }

        // Cannot be formatted as IP address
        if Self::looks_like_ip_address(&value) {
            return Err(ValidationError::BucketNameLooksLikeIpAddress);
        }

        Ok(Self(value))
    }

    /// Get the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if a string looks like an IP address
    fn looks_like_ip_address(s: &str) -> bool {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 {
            return false;
        }

        parts.iter().all(|part| part.parse::<u8>().is_ok())
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BucketName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

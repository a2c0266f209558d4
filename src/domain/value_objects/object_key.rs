use crate::domain::errors::ValidationError;

/// A validated object key (path) in the storage system
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > 1024 {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: 1024,
            });
        }

        // Check for invalid characters (null bytes)
        if value.contains('\0') {
            return Err(ValidationError::InvalidObjectKeyCharacter('\0'));
        }

        // Check for invalid patterns
        if value.starts_with('/') {
            return Err(ValidationError::ObjectKeyStartsWithSlash);
        }

        if value.ends_with('/') {
            return Err(ValidationError::ObjectKeyEndsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectKeyContainsDoubleSlash);
        }

        Ok(Self(value))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the file name part of the key (everything after the last '/')
    pub fn file_name(&self) -> &str {
        self.0.rfind('/').map_or(&self.0, |idx| &self.0[idx + 1..])
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ObjectKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object_key() {
        assert!(ObjectKey::new("file.txt").is_ok());
        assert!(ObjectKey::new("folder/file.txt").is_ok());
        assert!(ObjectKey::new("deep/folder/structure/file.txt").is_ok());
    }

    #[test]
    fn test_invalid_object_key() {
        assert_eq!(ObjectKey::new(""), Err(ValidationError::EmptyObjectKey));
        assert!(ObjectKey::new("/leading-slash").is_err());
        assert!(ObjectKey::new("double//slash").is_err());
        assert!(ObjectKey::new("null\0byte").is_err());
        assert!(ObjectKey::new("x".repeat(1025)).is_err());
    }

    #[test]
    fn test_trailing_slash_is_rejected() {
        assert_eq!(
            ObjectKey::new("logs/"),
            Err(ValidationError::ObjectKeyEndsWithSlash)
        );
        assert_eq!(
            ObjectKey::new("a/b/"),
            Err(ValidationError::ObjectKeyEndsWithSlash)
        );
        assert!(ObjectKey::new("logs").is_ok());
    }

    #[test]
    fn test_file_name() {
        let key = ObjectKey::new("folder/subfolder/file.txt").unwrap();
        assert_eq!(key.file_name(), "file.txt");

        let root_key = ObjectKey::new("file.txt").unwrap();
        assert_eq!(root_key.file_name(), "file.txt");
    }
}

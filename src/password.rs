//! Encryption password handed to the engine.

use zeroize::Zeroizing;

/// A password for archive encryption.
///
/// The text is wiped from memory when the last copy is dropped, and never
/// shown by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    inner: Zeroizing<String>,
}

impl Password {
    /// Creates a new password from a string.
    pub fn new<S: Into<String>>(password: S) -> Self {
        Self {
            inner: Zeroizing::new(password.into()),
        }
    }

    /// Returns the password as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns the password as UTF-16LE bytes, the encoding 7-Zip engines
    /// expect in their text password callbacks.
    pub fn as_utf16_le(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(
            self.inner
                .encode_utf16()
                .flat_map(|c| c.to_le_bytes())
                .collect(),
        )
    }

    /// Returns true if the password is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16le() {
        let password = Password::new("ab");
        assert_eq!(password.as_utf16_le().as_slice(), &[0x61, 0x00, 0x62, 0x00]);
    }

    #[test]
    fn test_debug_hides_text() {
        let debug = format!("{:?}", Password::new("secret"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("len"));
    }

    #[test]
    fn test_conversions() {
        let a: Password = "pw".into();
        let b: Password = String::from("pw").into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "pw");
        assert!(Password::new("").is_empty());
    }
}

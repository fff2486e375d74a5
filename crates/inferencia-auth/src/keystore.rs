use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use http::HeaderMap;
use inferencia_config::AuthConfig;
use inferencia_core::AuthenticatedKey;
use sha2::{Digest, Sha256};

use crate::{AuthError, bearer_token};

/// Environment variable holding comma-separated keys, preferred over the file
pub const API_KEYS_ENV: &str = "INFERENCIA_API_KEYS";

type KeyDigest = [u8; 32];

/// Accepted API keys
///
/// Only SHA-256 digests are retained. The store is immutable once loaded,
/// so lookups need no locking.
#[derive(Clone, Default)]
pub struct KeyStore {
    digests: HashSet<KeyDigest>,
}

impl KeyStore {
    /// Load keys from `INFERENCIA_API_KEYS` when set, otherwise from the keys file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or no key is found
    pub fn load(config: &AuthConfig) -> Result<Self, AuthError> {
        if let Ok(raw) = std::env::var(API_KEYS_ENV)
            && !raw.trim().is_empty()
        {
            let store = Self::from_keys(raw.split(','));
            tracing::debug!(source = API_KEYS_ENV, keys = store.len(), "loaded API keys");
            return store.non_empty(&config.keys_file);
        }

        let store = Self::from_file(&config.keys_file)?;
        tracing::debug!(source = %config.keys_file.display(), keys = store.len(), "loaded API keys");
        store.non_empty(&config.keys_file)
    }

    /// Read a keys file: one key per line, blank lines and `#` comments skipped
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::KeysFile {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_keys(
            contents.lines().filter(|line| !line.trim_start().starts_with('#')),
        ))
    }

    /// Build a store from raw keys, trimming whitespace and skipping empties
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let digests = keys
            .into_iter()
            .filter_map(|key| {
                let key = key.as_ref().trim();
                (!key.is_empty()).then(|| digest(key))
            })
            .collect();

        Self { digests }
    }

    /// Whether `key` is accepted
    pub fn contains(&self, key: &str) -> bool {
        self.digests.contains(&digest(key))
    }

    /// Authenticate a request from its `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredential`] for an absent or malformed
    /// header and [`AuthError::InvalidKey`] for an unknown key
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedKey, AuthError> {
        let token = bearer_token(headers)?;

        if self.contains(token) {
            Ok(AuthenticatedKey::new(token))
        } else {
            Err(AuthError::InvalidKey)
        }
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    fn non_empty(self, path: &Path) -> Result<Self, AuthError> {
        if self.is_empty() {
            return Err(AuthError::NoKeys {
                env: API_KEYS_ENV,
                path: PathBuf::from(path),
            });
        }
        Ok(self)
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore").field("keys", &self.digests.len()).finish()
    }
}

fn digest(key: &str) -> KeyDigest {
    Sha256::digest(key.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use http::{HeaderValue, header::AUTHORIZATION};
    use indoc::indoc;

    use super::*;

    fn keys_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn config(path: &Path) -> AuthConfig {
        AuthConfig {
            keys_file: path.to_path_buf(),
        }
    }

    #[test]
    fn file_skips_comments_and_blank_lines() {
        let file = keys_file(indoc! {"
            # production keys
            sk-alpha

              sk-beta  
            #sk-disabled
        "});

        let store = KeyStore::from_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("sk-alpha"));
        assert!(store.contains("sk-beta"));
        assert!(!store.contains("sk-disabled"));
        assert!(!store.contains("#sk-disabled"));
    }

    #[test]
    fn env_takes_precedence_over_file() {
        let file = keys_file("sk-from-file\n");

        temp_env::with_var(API_KEYS_ENV, Some(" sk-env-1 , ,sk-env-2"), || {
            let store = KeyStore::load(&config(file.path())).unwrap();
            assert_eq!(store.len(), 2);
            assert!(store.contains("sk-env-1"));
            assert!(store.contains("sk-env-2"));
            assert!(!store.contains("sk-from-file"));
        });
    }

    #[test]
    fn falls_back_to_file_without_env() {
        let file = keys_file("sk-from-file\n");

        temp_env::with_var_unset(API_KEYS_ENV, || {
            let store = KeyStore::load(&config(file.path())).unwrap();
            assert!(store.contains("sk-from-file"));
        });
    }

    #[test]
    fn empty_sources_are_an_error() {
        let file = keys_file("# nothing here\n\n");

        temp_env::with_var_unset(API_KEYS_ENV, || {
            let err = KeyStore::load(&config(file.path())).unwrap_err();
            assert!(matches!(err, AuthError::NoKeys { .. }));
        });

        temp_env::with_var(API_KEYS_ENV, Some(" , "), || {
            let err = KeyStore::load(&config(file.path())).unwrap_err();
            assert!(matches!(err, AuthError::NoKeys { .. }));
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        temp_env::with_var_unset(API_KEYS_ENV, || {
            let err = KeyStore::load(&config(Path::new("/nonexistent/inferencia/keys.txt"))).unwrap_err();
            assert!(matches!(err, AuthError::KeysFile { .. }));
        });
    }

    #[test]
    fn authenticate_distinguishes_internally_only() {
        let store = KeyStore::from_keys(["sk-valid-key-0001"]);

        let mut headers = HeaderMap::new();
        assert!(matches!(store.authenticate(&headers), Err(AuthError::MissingCredential)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer sk-wrong"));
        assert!(matches!(store.authenticate(&headers), Err(AuthError::InvalidKey)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer sk-valid-key-0001"));
        let key = store.authenticate(&headers).unwrap();
        assert_eq!(key.expose(), "sk-valid-key-0001");
    }

    #[test]
    fn debug_does_not_leak_keys() {
        let store = KeyStore::from_keys(["sk-top-secret"]);
        assert_eq!(format!("{store:?}"), "KeyStore { keys: 1 }");
    }
}

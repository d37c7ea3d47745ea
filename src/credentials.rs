//! API token resolution.
//!
//! Tokens live in a per-user store, one directory per identity, where the
//! token itself is the file stem:
//!
//! ```text
//! ~/.tmsubmit/api_tokens/<identity>/<TOKEN>.api_token
//! ```
//!
//! Resolution is a chain:
//!
//! 1. `--api-token <token>`: explicit per-command override
//! 2. `TM_API_TOKEN` env var
//! 3. the current user's directory in the store
//! 4. the configured `fallback-identity` directory
//!
//! Nothing resolving is fatal.

use std::{env, fmt, fs, io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error(
        "no API token found: pass --api-token, set TM_API_TOKEN, or add \
         <token>.api_token under {} for user '{user}'{}",
        store.display(),
        fallback.as_ref().map(|f| format!(" or fallback identity '{f}'")).unwrap_or_default()
    )]
    Missing {
        store: PathBuf,
        user: String,
        fallback: Option<String>,
    },

    #[error("failed to read token store {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Where a resolved token came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Environment,
    User(String),
    Fallback(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("--api-token"),
            Self::Environment => f.write_str("TM_API_TOKEN"),
            Self::User(id) => write!(f, "user '{id}'"),
            Self::Fallback(id) => write!(f, "fallback identity '{id}'"),
        }
    }
}

/// A resolved API token. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub source: CredentialSource,
    pub token: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("source", &self.source)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Directory of per-identity token files.
#[derive(Debug, Clone)]
pub struct TokenStore {
    root: PathBuf,
}

impl TokenStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the default store root: `~/.tmsubmit/api_tokens/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tmsubmit").join("api_tokens"))
    }

    /// Find the token for `identity`, if its directory holds one.
    ///
    /// With several token files, the lexically first wins.
    pub fn lookup(&self, identity: &str) -> Result<Option<String>, CredentialError> {
        let dir = self.root.join(identity);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CredentialError::Io { path: dir, source }),
        };

        let mut tokens = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CredentialError::Io {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "api_token")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && !stem.is_empty()
            {
                tokens.push(stem.to_string());
            }
        }
        tokens.sort();
        Ok(tokens.into_iter().next())
    }
}

/// The login name of whoever is running the tool.
pub fn current_user() -> Option<String> {
    ["USER", "USERNAME"]
        .iter()
        .find_map(|var| env::var(var).ok().filter(|v| !v.is_empty()))
}

/// Resolve a token from the full chain, consulting the environment.
pub fn resolve_credential(
    explicit: Option<&str>,
    store: &TokenStore,
    fallback: Option<&str>,
) -> Result<Credential, CredentialError> {
    let from_env = env::var("TM_API_TOKEN").ok();
    let user = current_user();
    resolve_with(
        explicit,
        from_env.as_deref(),
        store,
        user.as_deref(),
        fallback,
    )
}

/// The resolution chain with every input passed in.
pub fn resolve_with(
    explicit: Option<&str>,
    from_env: Option<&str>,
    store: &TokenStore,
    user: Option<&str>,
    fallback: Option<&str>,
) -> Result<Credential, CredentialError> {
    // 1. Explicit --api-token flag.
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Ok(Credential {
            source: CredentialSource::Explicit,
            token: token.to_string(),
        });
    }

    // 2. TM_API_TOKEN environment variable.
    if let Some(token) = from_env.filter(|t| !t.is_empty()) {
        return Ok(Credential {
            source: CredentialSource::Environment,
            token: token.to_string(),
        });
    }

    // 3. The current user's token directory.
    if let Some(user) = user {
        if let Some(token) = store.lookup(user)? {
            return Ok(Credential {
                source: CredentialSource::User(user.to_string()),
                token,
            });
        }
        tracing::warn!(user, "no user-specific API token");
    }

    // 4. The shared fallback identity.
    if let Some(identity) = fallback.filter(|f| !f.is_empty()) {
        if let Some(token) = store.lookup(identity)? {
            tracing::info!(identity, "using fallback identity's API token");
            return Ok(Credential {
                source: CredentialSource::Fallback(identity.to_string()),
                token,
            });
        }
        tracing::error!(identity, "no API token for fallback identity");
    }

    Err(CredentialError::Missing {
        store: store.root.clone(),
        user: user.unwrap_or("<unknown>").to_string(),
        fallback: fallback.map(String::from),
    })
}

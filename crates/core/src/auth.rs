use zeroize::Zeroizing;

/// Credential source for daemon MD5 challenge-response authentication
///. The core defines only this callback; reading a password file,
/// prompting interactively, or consulting an environment variable is the
/// caller's concern.
pub trait AuthProvider: Send + Sync {
    fn user(&self) -> String;
    fn password(&self) -> Zeroizing<String>;
}

/// An [`AuthProvider`] backed by fixed, in-memory values, for tests and for
/// the CLI's `--password-env` flag.
pub struct StaticAuth {
    user: String,
    password: Zeroizing<String>,
}

impl StaticAuth {
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl AuthProvider for StaticAuth {
    fn user(&self) -> String {
        self.user.clone()
    }

    fn password(&self) -> Zeroizing<String> {
        self.password.clone()
    }
}

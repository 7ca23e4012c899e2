use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::ModuleAuthenticator;

/// One exported directory tree, as offered by `#list` and requested by name
/// during the handshake.
pub struct ModuleConfig {
    pub name: String,
    pub root: PathBuf,
    pub comment: String,
    pub readable: bool,
    pub writable: bool,
    pub restricted_path: bool,
    pub listable: bool,
    pub authenticator: Option<Arc<dyn ModuleAuthenticator>>,
}

impl ModuleConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            comment: String::new(),
            readable: true,
            writable: false,
            restricted_path: true,
            listable: true,
            authenticator: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    #[must_use]
    pub fn with_listable(mut self, listable: bool) -> Self {
        self.listable = listable;
        self
    }

    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn ModuleAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.authenticator.is_some()
    }

    /// The `#list` line for this module: `name\tcomment`, or bare `name` if
    /// there's no comment.
    #[must_use]
    pub fn listing_line(&self) -> String {
        if self.comment.is_empty() {
            self.name.clone()
        } else {
            format!("{}\t{}", self.name, self.comment)
        }
    }
}

use std::fmt;

/// The role that produced a user-visible message, mirrored into the rendered
/// trailer the way upstream rsync tags `sender`/`receiver`/`generator`
/// diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Sender,
    Generator,
    Receiver,
    Daemon,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sender => "sender",
            Self::Generator => "generator",
            Self::Receiver => "receiver",
            Self::Daemon => "daemon",
        };
        write!(f, "{s}")
    }
}

/// A rendered diagnostic produced from a peer's out-of-band `ERROR`,
/// `WARNING`, or `LOG` message.
#[derive(Clone, Debug)]
pub struct Message {
    level: Level,
    text: String,
    role: Option<Role>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Level {
    Error,
    Warning,
    Info,
}

impl Message {
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
            role: None,
        }
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            text: text.into(),
            role: None,
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
            role: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Writes the message to `tracing` at the level matching upstream's
    /// behavior (`ERROR`/`WARNING` to stderr, `LOG` at info level).
    pub fn emit(&self) {
        match self.level {
            Level::Error => tracing::error!(target: "rrsync::peer", "{self}"),
            Level::Warning => tracing::warn!(target: "rrsync::peer", "{self}"),
            Level::Info => tracing::info!(target: "rrsync::peer", "{self}"),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Some(role) => write!(f, "[{role}] {}", self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_renders_role_trailer() {
        let msg = Message::error("delta-transfer failure").with_role(Role::Sender);
        assert_eq!(msg.to_string(), "[sender] delta-transfer failure");
    }
}

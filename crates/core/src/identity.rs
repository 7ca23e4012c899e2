/// A POSIX user or group identity as carried in `RsyncFileAttributes`.
///
/// The name is optional because numeric-id transfers (`--numeric-ids`) omit
/// it, and because a receiver may not be able to resolve a sender-side name
/// to a local account.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Identity {
    pub id: u32,
    pub name: Option<String>,
}

impl Identity {
    #[must_use]
    pub const fn numeric(id: u32) -> Self {
        Self { id, name: None }
    }

    #[must_use]
    pub fn named(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

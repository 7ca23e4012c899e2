// Raw `getuid`/`getgid`/`gethostname` calls are the only place in this crate
// that needs unsafe FFI; everything else is safe by construction.
#![allow(unsafe_code)]

use crate::identity::Identity;

/// Process-wide facts collected once and injected into session construction,
/// rather than re-read at every call site.
///
/// Collecting `umask`, the local user/group, and the hostname eagerly makes
/// the rest of the engine pure with respect to process environment, which in
/// turn makes the Sender/Generator/Receiver deterministic under test.
#[derive(Clone, Debug)]
pub struct Environment {
    pub umask: u32,
    pub user: Identity,
    pub group: Identity,
    pub hostname: String,
}

impl Environment {
    /// Builds an `Environment` from explicit values, for tests and for
    /// platforms where probing the OS is undesirable.
    #[must_use]
    pub fn new(umask: u32, user: Identity, group: Identity, hostname: impl Into<String>) -> Self {
        Self {
            umask,
            user,
            group,
            hostname: hostname.into(),
        }
    }

    /// Best-effort snapshot of the current process's environment.
    ///
    /// `umask` can only be *read* by temporarily changing it, which is not
    /// thread-safe; callers that need the real value should capture it at
    /// process startup before spawning any worker threads.
    #[cfg(unix)]
    #[must_use]
    pub fn probe() -> Self {
        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        let hostname = hostname_probe().unwrap_or_else(|| "localhost".to_string());
        Self {
            umask: 0o022,
            user: Identity::numeric(uid),
            group: Identity::numeric(gid),
            hostname,
        }
    }
}

#[cfg(unix)]
fn hostname_probe() -> Option<String> {
    let mut buf = vec![0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    buf.truncate(len);
    String::from_utf8(buf).ok()
}

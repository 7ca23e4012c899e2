use std::io::{Read, Write};

use rcore::RsyncError;
use protocol::{negotiate_version, read_greeting, write_greeting, BufferedChannel, MAX_PROTOCOL_VERSION};

use crate::auth::challenge_response;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};
use crate::module::ModuleConfig;

/// Outcome of a daemon-side handshake: either the client asked for the
/// module listing (and the connection is now done), or it selected and was
/// granted a module, ready to continue into [`rsync_io::negotiate_session`].
pub enum SessionOutcome<'a> {
    Listed,
    ModuleGranted(&'a ModuleConfig),
}

impl std::fmt::Debug for SessionOutcome<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionOutcome::Listed => f.write_str("Listed"),
            SessionOutcome::ModuleGranted(module) => {
                f.debug_tuple("ModuleGranted").field(&module.name).finish()
            }
        }
    }
}

fn write_line<S: Read + Write>(channel: &mut BufferedChannel<S>, line: &str) -> rcore::Result<()> {
    channel.put(line.as_bytes());
    channel.flush()
}

fn read_line<S: Read + Write>(channel: &mut BufferedChannel<S>) -> rcore::Result<String> {
    let mut bytes = Vec::new();
    loop {
        let byte = channel.get_byte()?;
        if byte == b'\n' {
            break;
        }
        bytes.push(byte);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Runs the daemon side of the `@RSYNCD:` greeting, module request (or
/// `#list`), and `AUTHREQD` challenge-response exchange.
///
/// On `Ok(SessionOutcome::ModuleGranted(module))`, the caller continues the
/// session with [`rsync_io::negotiate_session`] using [`rsync_io::Role::Server`]
/// over the same channel. On `Ok(SessionOutcome::Listed)` or `Err`, the
/// connection is finished and should be closed.
pub fn handle_connection<'a, S: Read + Write>(
    channel: &mut BufferedChannel<S>,
    config: &'a DaemonConfig,
) -> Result<SessionOutcome<'a>> {
    write_greeting(channel, MAX_PROTOCOL_VERSION)?;
    let peer_version = read_greeting(channel)?;
    negotiate_version(peer_version).map_err(RsyncError::from)?;

    let request = read_line(channel)?;

    if request == "#list" {
        for module in config.listable_modules() {
            write_line(channel, &format!("{}\n", module.listing_line()))?;
        }
        write_line(channel, "@RSYNCD: EXIT\n")?;
        return Ok(SessionOutcome::Listed);
    }

    let Some(module) = config.find(&request) else {
        write_line(channel, &format!("@ERROR: Unknown module '{request}'\n"))?;
        return Err(DaemonError::UnknownModule(request));
    };

    if let Some(authenticator) = &module.authenticator {
        let challenge = crate::auth::generate_challenge();
        write_line(channel, &format!("@RSYNCD: AUTHREQD {challenge}\n"))?;

        let response_line = read_line(channel)?;
        let mut parts = response_line.splitn(2, ' ');
        let (user, response) = match (parts.next(), parts.next()) {
            (Some(user), Some(response)) if !user.is_empty() && !response.is_empty() => {
                (user, response)
            }
            _ => {
                write_line(channel, "@ERROR: access denied\n")?;
                return Err(DaemonError::AccessDenied);
            }
        };

        match authenticator.expected_response(user, &challenge) {
            Some(expected) if expected == response => {}
            _ => {
                write_line(channel, "@ERROR: access denied\n")?;
                return Err(DaemonError::AccessDenied);
            }
        }
    }

    write_line(channel, "@RSYNCD: OK\n")?;
    Ok(SessionOutcome::ModuleGranted(module))
}

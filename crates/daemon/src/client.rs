use std::io::{Read, Write};

use protocol::{negotiate_version, read_greeting, write_greeting, BufferedChannel, MAX_PROTOCOL_VERSION};

use crate::error::Result;

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

/// Runs the client side of `#list` against a daemon:
/// greeting exchange, the `#list` request, then every banner line up to
/// (not including) the terminating `@RSYNCD: EXIT` or `@RSYNCD: OK`.
pub fn list_modules<S: Read + Write>(channel: &mut BufferedChannel<S>) -> Result<Vec<String>> {
    write_greeting(channel, MAX_PROTOCOL_VERSION)?;
    let peer_version = read_greeting(channel)?;
    negotiate_version(peer_version).map_err(rcore::RsyncError::from)?;

    write_line(channel, "#list\n")?;

    let mut lines = Vec::new();
    loop {
        let line = read_line(channel)?;
        if line == "@RSYNCD: EXIT" || line == "@RSYNCD: OK" || line.starts_with("@ERROR") {
            break;
        }
        lines.push(line);
    }
    Ok(lines)
}

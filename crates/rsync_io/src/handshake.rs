use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use rcore::{Result, RsyncError};
use protocol::{
    negotiate_version, read_args, read_checksum_seed, read_compat_flags, read_greeting,
    write_args, write_checksum_seed, write_compat_flags, write_greeting, BufferedChannel,
    CompatFlags, MAX_PROTOCOL_VERSION,
};

/// Which side of the version/argument/compat-flags/seed exchange a caller
/// is playing. The side that ends up running as the `--server` process
/// also owns compat-flags and checksum-seed generation, mirroring upstream
/// rsync's convention.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Initiator,
    Server,
}

/// Negotiated facts a session needs before the multiplexed region begins.
#[derive(Clone, Debug)]
pub struct NegotiatedSession {
    pub protocol_version: u32,
    pub compat_flags: CompatFlags,
    pub checksum_seed: i32,
}

/// Options that affect handshake negotiation.
#[derive(Clone, Copy, Debug, Default)]
pub struct HandshakeOptions {
    pub recursive: bool,
}

/// Runs the version, argument, compat-flags, and seed exchange over an
/// already-connected channel. Module listing and authentication
/// (daemon-only) happen before this call; this function covers the part
/// shared by a daemon-spawned `--server` process and a direct two-peer
/// (e.g. ssh) connection.
pub fn negotiate_session<S: Read + Write>(
    channel: &mut BufferedChannel<S>,
    role: Role,
    args: &[String],
    options: HandshakeOptions,
) -> Result<NegotiatedSession> {
    write_greeting(channel, MAX_PROTOCOL_VERSION)?;
    let peer_version = read_greeting(channel)?;
    let protocol_version = negotiate_version(peer_version)?;
    tracing::debug!(?role, peer_version, protocol_version, "negotiated protocol version");

    match role {
        Role::Initiator => {
            write_args(channel, args)?;
            let compat_flags = read_compat_flags(channel)?;
            if options.recursive && !compat_flags.contains(CompatFlags::INC_RECURSE) {
                tracing::warn!("recursive transfer requested but peer lacks CF_INC_RECURSE");
                return Err(RsyncError::Argument(
                    "recursive transfer requested but peer lacks CF_INC_RECURSE".to_string(),
                ));
            }
            let checksum_seed = read_checksum_seed(channel)?;
            Ok(NegotiatedSession { protocol_version, compat_flags, checksum_seed })
        }
        Role::Server => {
            let _received_args = read_args(channel)?;
            let mut compat_flags = CompatFlags::empty();
            if options.recursive {
                compat_flags.insert(CompatFlags::INC_RECURSE);
                compat_flags.insert(CompatFlags::SAFE_FLIST);
            }
            write_compat_flags(channel, compat_flags)?;
            let checksum_seed = generate_checksum_seed();
            write_checksum_seed(channel, checksum_seed)?;
            Ok(NegotiatedSession { protocol_version, compat_flags, checksum_seed })
        }
    }
}

fn generate_checksum_seed() -> i32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as i32)
        .unwrap_or(0)
}

use std::io::{Read, Write};

use rcore::error::Result;

use crate::channel::BufferedChannel;
use crate::error::ProtocolError;

/// Oldest protocol version this implementation speaks.
pub const MIN_PROTOCOL_VERSION: u32 = 30;
/// Newest protocol version this implementation speaks.
pub const MAX_PROTOCOL_VERSION: u32 = 31;

/// Compatibility flags exchanged as a single byte once both sides have
/// negotiated protocol 30 or newer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CompatFlags(u8);

impl CompatFlags {
    pub const INC_RECURSE: u8 = 0x01;
    pub const SYMLINK_TIMES: u8 = 0x02;
    pub const SYMLINK_ICONV: u8 = 0x04;
    pub const SAFE_FLIST: u8 = 0x08;
    pub const AVOID_XATTR_OPTIM: u8 = 0x10;
    pub const CHKSUM_SEED_FIX: u8 = 0x20;

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

/// Writes the ASCII `@RSYNCD: N.0\n` greeting line. This
/// implementation only ever emits the ASCII greeting form, never the
/// legacy binary prologue some peers probe for.
pub fn write_greeting<S>(channel: &mut BufferedChannel<S>, version: u32) -> Result<()>
where
    S: Read + Write,
{
    let line = format!("@RSYNCD: {version}.0\n");
    channel.put(line.as_bytes());
    Ok(())
}

/// Reads an `@RSYNCD: N.M\n` greeting line and returns its major version.
pub fn read_greeting<S>(channel: &mut BufferedChannel<S>) -> Result<u32>
where
    S: Read + Write,
{
    let mut line = Vec::new();
    loop {
        let byte = channel.get_byte()?;
        if byte == b'\n' {
            break;
        }
        line.push(byte);
    }
    let text = String::from_utf8_lossy(&line);
    let version_part = text
        .strip_prefix("@RSYNCD: ")
        .ok_or_else(|| ProtocolError::MalformedGreeting(text.clone().into_owned()))?;
    let major = version_part
        .split('.')
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| ProtocolError::MalformedGreeting(text.into_owned()))?;
    Ok(major)
}

/// Negotiates the session's protocol version: the lower of our maximum and
/// the peer's advertised version, rejecting anything below
/// [`MIN_PROTOCOL_VERSION`].
pub fn negotiate_version(peer_version: u32) -> std::result::Result<u32, ProtocolError> {
    if peer_version < MIN_PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion {
            peer: peer_version,
            min: MIN_PROTOCOL_VERSION,
            max: MAX_PROTOCOL_VERSION,
        });
    }
    Ok(peer_version.min(MAX_PROTOCOL_VERSION))
}

pub fn write_compat_flags<S>(channel: &mut BufferedChannel<S>, flags: CompatFlags) -> Result<()>
where
    S: Read + Write,
{
    channel.put_byte(flags.bits());
    Ok(())
}

pub fn read_compat_flags<S>(channel: &mut BufferedChannel<S>) -> Result<CompatFlags>
where
    S: Read + Write,
{
    Ok(CompatFlags::from_bits(channel.get_byte()?))
}

pub fn write_checksum_seed<S>(channel: &mut BufferedChannel<S>, seed: i32) -> Result<()>
where
    S: Read + Write,
{
    channel.put_i32(seed);
    Ok(())
}

pub fn read_checksum_seed<S>(channel: &mut BufferedChannel<S>) -> Result<i32>
where
    S: Read + Write,
{
    channel.get_i32()
}

/// Writes a NUL-terminated argument list, with a trailing empty argument
/// marking the end of the list.
pub fn write_args<S>(channel: &mut BufferedChannel<S>, args: &[String]) -> Result<()>
where
    S: Read + Write,
{
    for arg in args {
        channel.put(arg.as_bytes());
        channel.put_byte(0);
    }
    channel.put_byte(0);
    Ok(())
}

pub fn read_args<S>(channel: &mut BufferedChannel<S>) -> Result<Vec<String>>
where
    S: Read + Write,
{
    let mut args = Vec::new();
    loop {
        let mut buf = Vec::new();
        loop {
            let byte = channel.get_byte()?;
            if byte == 0 {
                break;
            }
            buf.push(byte);
        }
        if buf.is_empty() {
            break;
        }
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct DuplexBuf {
        read: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for DuplexBuf {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.read.read(buf)
        }
    }

    impl Write for DuplexBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn duplex_with(bytes: Vec<u8>) -> BufferedChannel<DuplexBuf> {
        BufferedChannel::new(DuplexBuf {
            read: Cursor::new(bytes),
            written: Vec::new(),
        })
    }

    #[test]
    fn greeting_round_trips() {
        let mut writer = duplex_with(Vec::new());
        write_greeting(&mut writer, 31).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_mut().written.clone();

        let mut reader = duplex_with(bytes);
        assert_eq!(read_greeting(&mut reader).unwrap(), 31);
    }

    #[test]
    fn malformed_greeting_is_rejected() {
        let mut reader = duplex_with(b"not a greeting\n".to_vec());
        let err = read_greeting(&mut reader).unwrap_err();
        assert!(matches!(err, rcore::RsyncError::Protocol(_)));
    }

    #[test]
    fn negotiate_caps_to_our_maximum() {
        assert_eq!(negotiate_version(9999).unwrap(), MAX_PROTOCOL_VERSION);
    }

    #[test]
    fn negotiate_rejects_ancient_peers() {
        assert!(negotiate_version(20).is_err());
    }

    #[test]
    fn negotiate_passes_through_supported_version() {
        assert_eq!(negotiate_version(30).unwrap(), 30);
    }

    #[test]
    fn compat_flags_round_trip() {
        let mut flags = CompatFlags::empty();
        flags.insert(CompatFlags::SAFE_FLIST);
        flags.insert(CompatFlags::INC_RECURSE);

        let mut writer = duplex_with(Vec::new());
        write_compat_flags(&mut writer, flags).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_mut().written.clone();

        let mut reader = duplex_with(bytes);
        let decoded = read_compat_flags(&mut reader).unwrap();
        assert!(decoded.contains(CompatFlags::SAFE_FLIST));
        assert!(decoded.contains(CompatFlags::INC_RECURSE));
        assert!(!decoded.contains(CompatFlags::SYMLINK_TIMES));
    }

    #[test]
    fn checksum_seed_round_trips_negative_values() {
        let mut writer = duplex_with(Vec::new());
        write_checksum_seed(&mut writer, -12345).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_mut().written.clone();

        let mut reader = duplex_with(bytes);
        assert_eq!(read_checksum_seed(&mut reader).unwrap(), -12345);
    }

    #[test]
    fn argument_list_round_trips_including_empty_list() {
        let mut writer = duplex_with(Vec::new());
        write_args(&mut writer, &["--server".to_string(), "-logDtpre.iLsfxC".to_string()]).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_mut().written.clone();

        let mut reader = duplex_with(bytes);
        let args = read_args(&mut reader).unwrap();
        assert_eq!(args, vec!["--server".to_string(), "-logDtpre.iLsfxC".to_string()]);

        let mut writer = duplex_with(Vec::new());
        write_args(&mut writer, &[]).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_mut().written.clone();
        let mut reader = duplex_with(bytes);
        assert!(read_args(&mut reader).unwrap().is_empty());
    }
}

/// Multiplex frame tags.
///
/// The top byte of every multiplex tag word carries one of these codes; the
/// low three bytes carry the frame's payload length.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum MessageCode {
    Data = 0,
    ErrorXfer = 1,
    Info = 2,
    Error = 3,
    Warning = 4,
    ErrorSocket = 5,
    Log = 6,
    Client = 7,
    ErrorUtf8 = 8,
    Redo = 9,
    Flist = 20,
    FlistEof = 21,
    IoError = 22,
    Noop = 42,
    Done = 86,
    Success = 100,
    Deleted = 101,
    NoSend = 102,
}

impl MessageCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Data,
            1 => Self::ErrorXfer,
            2 => Self::Info,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::ErrorSocket,
            6 => Self::Log,
            7 => Self::Client,
            8 => Self::ErrorUtf8,
            9 => Self::Redo,
            20 => Self::Flist,
            21 => Self::FlistEof,
            22 => Self::IoError,
            42 => Self::Noop,
            86 => Self::Done,
            100 => Self::Success,
            101 => Self::Deleted,
            102 => Self::NoSend,
            _ => return None,
        })
    }

    /// True for the codes that carry human-readable text destined for the
    /// peer's message log rather than structured protocol data.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            Self::ErrorXfer
                | Self::Info
                | Self::Error
                | Self::Warning
                | Self::ErrorSocket
                | Self::Log
                | Self::ErrorUtf8
        )
    }
}

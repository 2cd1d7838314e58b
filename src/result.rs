//! The 32-bit result envelope handed back to guest software.
//!
//! Layout, low bit first:
//!
//! | bits  | field       |
//! |-------|-------------|
//! | 0-9   | description |
//! | 10-17 | module      |
//! | 21-26 | summary     |
//! | 27-31 | level       |

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorModule {
    Common = 0,
    Kernel = 1,
    Util = 2,
    FileServer = 3,
    LoaderServer = 4,
    Os = 6,
    Fs = 17,
    Am = 32,
    Application = 254,
    InvalidResult = 255,
}

impl ErrorModule {
    fn from_raw(raw: u32) -> Option<Self> {
        use ErrorModule::*;
        Some(match raw {
            0 => Common,
            1 => Kernel,
            2 => Util,
            3 => FileServer,
            4 => LoaderServer,
            6 => Os,
            17 => Fs,
            32 => Am,
            254 => Application,
            255 => InvalidResult,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorSummary {
    Success = 0,
    NothingHappened = 1,
    WouldBlock = 2,
    OutOfResource = 3,
    NotFound = 4,
    InvalidState = 5,
    NotSupported = 6,
    InvalidArgument = 7,
    WrongArgument = 8,
    Canceled = 9,
    StatusChanged = 10,
    Internal = 11,
    InvalidResultValue = 63,
}

impl ErrorSummary {
    fn from_raw(raw: u32) -> Self {
        use ErrorSummary::*;
        match raw {
            0 => Success,
            1 => NothingHappened,
            2 => WouldBlock,
            3 => OutOfResource,
            4 => NotFound,
            5 => InvalidState,
            6 => NotSupported,
            7 => InvalidArgument,
            8 => WrongArgument,
            9 => Canceled,
            10 => StatusChanged,
            11 => Internal,
            _ => InvalidResultValue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorLevel {
    Success = 0,
    Info = 1,
    Status = 25,
    Temporary = 26,
    Permanent = 27,
    Usage = 28,
    Reinitialize = 29,
    Reset = 30,
    Fatal = 31,
}

impl ErrorLevel {
    fn from_raw(raw: u32) -> Option<Self> {
        use ErrorLevel::*;
        Some(match raw {
            0 => Success,
            1 => Info,
            25 => Status,
            26 => Temporary,
            27 => Permanent,
            28 => Usage,
            29 => Reinitialize,
            30 => Reset,
            31 => Fatal,
            _ => return None,
        })
    }
}

/// Generic descriptions shared by every module. Module specific descriptions
/// (like the FS ones in [`crate::error`]) live below 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorDescription {
    Success = 0,
    InvalidSection = 1000,
    TooLarge = 1001,
    NotAuthorized = 1002,
    AlreadyDone = 1003,
    InvalidSize = 1004,
    InvalidEnumValue = 1005,
    InvalidCombination = 1006,
    NoData = 1007,
    Busy = 1008,
    MisalignedAddress = 1009,
    MisalignedSize = 1010,
    OutOfMemory = 1011,
    NotImplemented = 1012,
    InvalidAddress = 1013,
    InvalidPointer = 1014,
    InvalidHandle = 1015,
    NotInitialized = 1016,
    AlreadyInitialized = 1017,
    NotFound = 1018,
    CancelRequested = 1019,
    AlreadyExists = 1020,
    OutOfRange = 1021,
    Timeout = 1022,
    InvalidResultValue = 1023,
}

/// A packed result code as seen by guest software.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);

    pub const fn new(
        description: u32,
        module: ErrorModule,
        summary: ErrorSummary,
        level: ErrorLevel,
    ) -> Self {
        Self(
            (description & 0x3ff)
                | ((module as u32 & 0xff) << 10)
                | ((summary as u32 & 0x3f) << 21)
                | ((level as u32 & 0x1f) << 27),
        )
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn description(self) -> u32 {
        self.0 & 0x3ff
    }

    pub const fn module_raw(self) -> u32 {
        (self.0 >> 10) & 0xff
    }

    pub fn module(self) -> Option<ErrorModule> {
        ErrorModule::from_raw(self.module_raw())
    }

    pub fn summary(self) -> ErrorSummary {
        ErrorSummary::from_raw((self.0 >> 21) & 0x3f)
    }

    pub fn level(self) -> Option<ErrorLevel> {
        ErrorLevel::from_raw((self.0 >> 27) & 0x1f)
    }

    /// Negative codes (level bits set to 0b1xxxx) are failures.
    pub const fn is_error(self) -> bool {
        (self.0 as i32) < 0
    }

    pub const fn is_success(self) -> bool {
        !self.is_error()
    }
}

impl From<ErrorDescription> for u32 {
    fn from(value: ErrorDescription) -> Self {
        value as u32
    }
}

impl fmt::Debug for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultCode({:08X})", self.0)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X} (description: {}, module: {}, summary: {:?}, level: {:?})",
            self.0,
            self.description(),
            self.module_raw(),
            self.summary(),
            self.level(),
        )
    }
}

use crate::{
    common::{ArchiveHandle, ArchiveIdCode},
    result::{ErrorDescription, ErrorLevel, ErrorModule, ErrorSummary, ResultCode},
};

/// FS specific descriptions.
mod desc {
    pub const ROMFS_NOT_FOUND: u32 = 100;
    pub const ARCHIVE_NOT_MOUNTED: u32 = 101;
    pub const FILE_NOT_FOUND: u32 = 112;
    pub const PATH_NOT_FOUND: u32 = 113;
    pub const NOT_FOUND: u32 = 120;
    pub const GAMECARD_NOT_INSERTED: u32 = 141;
    pub const FILE_ALREADY_EXISTS: u32 = 180;
    pub const DIRECTORY_ALREADY_EXISTS: u32 = 185;
    pub const ALREADY_EXISTS: u32 = 190;
    pub const INVALID_OPEN_FLAGS: u32 = 230;
    pub const DIRECTORY_NOT_EMPTY: u32 = 240;
    pub const NOT_A_FILE: u32 = 250;
    pub const NOT_FORMATTED: u32 = 340;
    pub const EXEFS_SECTION_NOT_FOUND: u32 = 567;
    pub const COMMAND_NOT_ALLOWED: u32 = 630;
    pub const INVALID_READ_FLAG: u32 = 700;
    pub const INVALID_PATH: u32 = 702;
    pub const UNSUPPORTED_OPEN_FLAGS: u32 = 760;
    pub const UNEXPECTED_FILE_OR_DIRECTORY: u32 = 770;
}

const fn fs(description: u32, summary: ErrorSummary, level: ErrorLevel) -> ResultCode {
    ResultCode::new(description, ErrorModule::Fs, summary, level)
}

use ErrorLevel::{Info, Permanent, Status, Usage};
use ErrorSummary::*;

pub const ERROR_INVALID_PATH: ResultCode = fs(desc::INVALID_PATH, InvalidArgument, Usage);
pub const ERROR_UNSUPPORTED_OPEN_FLAGS: ResultCode =
    fs(desc::UNSUPPORTED_OPEN_FLAGS, NotSupported, Usage);
pub const ERROR_INVALID_OPEN_FLAGS: ResultCode = fs(desc::INVALID_OPEN_FLAGS, Canceled, Status);
pub const ERROR_INVALID_READ_FLAG: ResultCode = fs(desc::INVALID_READ_FLAG, InvalidArgument, Usage);
pub const ERROR_FILE_NOT_FOUND: ResultCode = fs(desc::FILE_NOT_FOUND, NotFound, Status);
pub const ERROR_PATH_NOT_FOUND: ResultCode = fs(desc::PATH_NOT_FOUND, NotFound, Status);
pub const ERROR_NOT_FOUND: ResultCode = fs(desc::NOT_FOUND, NotFound, Status);
pub const ERROR_UNEXPECTED_FILE_OR_DIRECTORY: ResultCode =
    fs(desc::UNEXPECTED_FILE_OR_DIRECTORY, NotSupported, Usage);
pub const ERROR_UNEXPECTED_FILE_OR_DIRECTORY_SDMC: ResultCode =
    fs(desc::NOT_A_FILE, Canceled, Status);
pub const ERROR_DIRECTORY_ALREADY_EXISTS: ResultCode =
    fs(desc::DIRECTORY_ALREADY_EXISTS, NothingHappened, Status);
pub const ERROR_FILE_ALREADY_EXISTS: ResultCode =
    fs(desc::FILE_ALREADY_EXISTS, NothingHappened, Status);
pub const ERROR_ALREADY_EXISTS: ResultCode = fs(desc::ALREADY_EXISTS, NothingHappened, Status);
pub const ERROR_DIRECTORY_NOT_EMPTY: ResultCode = fs(desc::DIRECTORY_NOT_EMPTY, Canceled, Status);
pub const ERROR_GAMECARD_NOT_INSERTED: ResultCode =
    fs(desc::GAMECARD_NOT_INSERTED, NotFound, Status);
pub const ERROR_ROMFS_NOT_FOUND: ResultCode = fs(desc::ROMFS_NOT_FOUND, NotFound, Status);
pub const ERROR_EXEFS_SECTION_NOT_FOUND: ResultCode =
    fs(desc::EXEFS_SECTION_NOT_FOUND, NotFound, Status);
pub const ERROR_COMMAND_NOT_ALLOWED: ResultCode =
    fs(desc::COMMAND_NOT_ALLOWED, WrongArgument, Permanent);

/// An archive handle that is not (or no longer) open. 0xC8804465
pub const ERR_INVALID_ARCHIVE_HANDLE: ResultCode = fs(desc::ARCHIVE_NOT_MOUNTED, NotFound, Status);
/// Save data that exists in name only and still has to be formatted by the title.
pub const ERR_NOT_FORMATTED: ResultCode = fs(desc::NOT_FORMATTED, InvalidState, Status);
pub const ERR_NOT_FOUND_INVALID_STATE: ResultCode = fs(desc::NOT_FOUND, InvalidState, Status);

pub const ERROR_NOT_IMPLEMENTED: ResultCode =
    fs(ErrorDescription::NotImplemented as u32, NotSupported, Permanent);
pub const ERROR_INVALID_ENUM_VALUE: ResultCode =
    fs(ErrorDescription::InvalidEnumValue as u32, InvalidArgument, Usage);
pub const ERROR_TOO_LARGE: ResultCode = fs(ErrorDescription::TooLarge as u32, OutOfResource, Info);
pub const ERROR_OUT_OF_HANDLES: ResultCode =
    fs(ErrorDescription::OutOfMemory as u32, OutOfResource, Permanent);
/// What the host side reports when it could not carry out an operation for
/// reasons it did not classify any further.
pub const ERROR_HOST_OPERATION_FAILED: ResultCode =
    fs(ErrorDescription::NoData as u32, Canceled, Status);

#[derive(Debug, thiserror_no_std::Error)]
pub enum FsError {
    #[error("{0}")]
    Code(ResultCode),

    #[error("archive handle {0} is not open")]
    InvalidArchiveHandle(ArchiveHandle),

    #[error("no archive is registered for {0}")]
    ArchiveNotRegistered(ArchiveIdCode),

    #[error("unknown archive id code 0x{0:08x}")]
    UnknownArchiveIdCode(u32),

    #[error("unknown media type {0}")]
    UnknownMediaType(u32),

    #[error("an archive is already registered for {0}")]
    AlreadyRegistered(ArchiveIdCode),

    #[error("renaming from archive {src} into archive {dest} is not supported")]
    CrossArchiveRename {
        src: ArchiveHandle,
        dest: ArchiveHandle,
    },

    #[error("all archive handles are used up")]
    OutOfHandles,

    #[error("tried to write to a readonly storage")]
    StorageIsReadOnly,

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("binrw error")]
    BinRw(#[from] binrw::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FsError {
    /// The result code guest software gets to see for this error.
    pub fn code(&self) -> ResultCode {
        use FsError::*;
        match self {
            Code(code) => *code,
            InvalidArchiveHandle(_) => ERR_INVALID_ARCHIVE_HANDLE,
            ArchiveNotRegistered(_) | UnknownArchiveIdCode(_) => ERROR_NOT_FOUND,
            UnknownMediaType(_) => ERROR_INVALID_ENUM_VALUE,
            AlreadyRegistered(_) => ERROR_ALREADY_EXISTS,
            CrossArchiveRename { .. } => ERROR_NOT_IMPLEMENTED,
            OutOfHandles => ERROR_OUT_OF_HANDLES,
            StorageIsReadOnly => ERROR_UNSUPPORTED_OPEN_FLAGS,
            Io(_) | BinRw(_) | Other(_) => ERROR_HOST_OPERATION_FAILED,
        }
    }

    pub fn summary(&self) -> ErrorSummary {
        self.code().summary()
    }
}

impl From<ResultCode> for FsError {
    fn from(value: ResultCode) -> Self {
        FsError::Code(value)
    }
}

impl From<FsError> for std::io::Error {
    fn from(value: FsError) -> Self {
        match value {
            FsError::Io(e) => e,
            other => crate::utils::other_io_error(other),
        }
    }
}

pub type FsResult<T> = core::result::Result<T, FsError>;

mod archive_handle;
mod archive_id;
mod program_id;

pub use archive_handle::ArchiveHandle;
pub use archive_id::{ArchiveIdCode, MediaType};
pub use program_id::ProgramId;

/// Unique system identifier hash (ID0) used when no console derived one is known.
pub const SYSTEM_ID: &str = "00000000000000000000000000000000";
/// Scrambled SD card CID (ID1) used when no card derived one is known.
pub const SDCARD_ID: &str = "00000000000000000000000000000000";

//! Archive backends and the per-category factories producing them.
//!
//! Both sets are closed: every category the manager knows about has exactly
//! one factory type, and every backend a factory can produce is a variant of
//! [`ArchiveBackend`].

use crate::{
    common::ProgramId,
    directory::DirectoryListing,
    error::{ERROR_INVALID_PATH, ERR_NOT_FORMATTED},
    file::Mode,
    path::FsPath,
    storage::Storage,
    FsError, FsResult,
};
use binrw::{io::Cursor, meta::ReadEndian, BinRead, BinWrite};
use enum_dispatch::enum_dispatch;
use std::{fs, io, path::Path};

mod extsavedata;
mod host;
mod ncch;
mod savedata;
mod sdmc;
mod systemsavedata;

pub use self::{
    extsavedata::{ext_save_data_path, ExtSaveDataArchive, ExtSaveDataFactory},
    ncch::{ncch_archive_path, NcchArchive, NcchData, NcchFactory, SelfNcchFactory},
    savedata::{
        OtherSaveDataGeneralFactory, OtherSaveDataPermittedFactory, SaveDataArchive,
        SaveDataFactory,
    },
    sdmc::{SdmcArchive, SdmcFactory, SdmcWriteOnlyArchive, SdmcWriteOnlyFactory},
    systemsavedata::{system_save_data_path, SystemSaveDataFactory},
};

/// Everything an open archive can be asked to do. Paths are forwarded as the
/// guest sent them, each backend validates them its own way.
#[enum_dispatch]
pub trait IArchiveBackend {
    fn name(&self) -> String;

    /// `mode` has already been checked for the combinations no archive accepts.
    fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage>;

    fn delete_file(&self, path: &FsPath) -> FsResult<()>;

    fn rename_file(&self, src: &FsPath, dest: &FsPath) -> FsResult<()>;

    fn delete_directory(&self, path: &FsPath) -> FsResult<()>;

    fn delete_directory_recursively(&self, path: &FsPath) -> FsResult<()>;

    /// Creates a zero filled file of `size` bytes.
    fn create_file(&self, path: &FsPath, size: u64) -> FsResult<()>;

    fn create_directory(&self, path: &FsPath) -> FsResult<()>;

    fn rename_directory(&self, src: &FsPath, dest: &FsPath) -> FsResult<()>;

    fn open_directory(&self, path: &FsPath) -> FsResult<DirectoryListing>;

    fn free_bytes(&self) -> u64;
}

#[enum_dispatch(IArchiveBackend)]
#[derive(Debug)]
pub enum ArchiveBackend {
    SaveData(SaveDataArchive),
    ExtSaveData(ExtSaveDataArchive),
    Sdmc(SdmcArchive),
    SdmcWriteOnly(SdmcWriteOnlyArchive),
    Ncch(NcchArchive),
}

/// One per archive category. `program_id` is the title currently running,
/// which is what the save data flavours resolve an empty path against.
#[enum_dispatch]
pub trait IArchiveFactory {
    fn name(&self) -> String;

    /// Prepares whatever the factory needs on the host. Called once, right
    /// after construction.
    fn initialize(&mut self) -> FsResult<()> {
        Ok(())
    }

    fn open(&mut self, path: &FsPath, program_id: ProgramId) -> FsResult<ArchiveBackend>;

    /// Erases the location `path` refers to and provisions it according to
    /// `info`.
    fn format(
        &mut self,
        path: &FsPath,
        info: &ArchiveFormatInfo,
        program_id: ProgramId,
    ) -> FsResult<()>;

    fn format_info(&self, path: &FsPath, program_id: ProgramId) -> FsResult<ArchiveFormatInfo>;
}

#[enum_dispatch(IArchiveFactory)]
#[derive(Debug)]
pub enum ArchiveFactory {
    SelfNcch(SelfNcchFactory),
    SaveData(SaveDataFactory),
    ExtSaveData(ExtSaveDataFactory),
    SystemSaveData(SystemSaveDataFactory),
    Sdmc(SdmcFactory),
    SdmcWriteOnly(SdmcWriteOnlyFactory),
    Ncch(NcchFactory),
    OtherSaveDataGeneral(OtherSaveDataGeneralFactory),
    OtherSaveDataPermitted(OtherSaveDataPermittedFactory),
}

/// Limits an archive was formatted with.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveFormatInfo {
    /// in bytes
    pub total_size: u32,
    pub number_directories: u32,
    pub number_files: u32,
    #[br(map = |b: u8| b != 0)]
    #[bw(map = |b: &bool| u8::from(*b))]
    #[brw(pad_after = 3)]
    pub duplicate_data: bool,
}

impl ArchiveFormatInfo {
    pub const SIZE: usize = 0x10;

    /// Reads the info persisted at `path`. A location that has none was
    /// never formatted.
    pub(crate) fn load(path: &Path) -> FsResult<Self> {
        let mut fp = match fs::File::open(path) {
            Ok(fp) => fp,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::error!("could not open metadata information for {}", path.display());
                return Err(ERR_NOT_FORMATTED.into());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::read(&mut fp)?)
    }

    pub(crate) fn store(&self, path: &Path) -> FsResult<()> {
        let mut fp = fs::File::create(path)?;
        self.write(&mut fp)?;
        Ok(())
    }
}

/// Decodes a fixed size binary archive path into its record.
pub(crate) fn parse_binary_path<T, const N: usize>(path: &FsPath) -> FsResult<T>
where
    T: ReadEndian + for<'a> BinRead<Args<'a> = ()>,
{
    let raw = path.binary_exact::<N>()?;
    T::read(&mut Cursor::new(raw)).map_err(|e| {
        log::error!("malformed binary path {path}: {e}");
        FsError::from(ERROR_INVALID_PATH)
    })
}

/// Wipes `dir` if present and recreates it empty.
pub(crate) fn recreate_dir(dir: &Path) -> FsResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

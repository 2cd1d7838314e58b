//! Per-title save data on the SD card, and the two ways of reaching another
//! title's save data.

use super::{
    host::{HostDirectory, HOST_FREE_BYTES, SAVE_DATA_ERRORS},
    parse_binary_path, recreate_dir, ArchiveBackend, ArchiveFormatInfo, IArchiveBackend,
    IArchiveFactory,
};
use crate::{
    common::{MediaType, ProgramId},
    config::FsConfig,
    directory::DirectoryListing,
    error::{ERROR_GAMECARD_NOT_INSERTED, ERROR_INVALID_PATH, ERR_NOT_FORMATTED},
    file::Mode,
    path::FsPath,
    storage::Storage,
    FsResult,
};
use std::path::PathBuf;

/// An opened save data directory.
#[derive(Debug, Clone)]
pub struct SaveDataArchive {
    host: HostDirectory,
}

impl SaveDataArchive {
    pub fn new(mount_point: PathBuf) -> Self {
        Self {
            host: HostDirectory::new(mount_point, &SAVE_DATA_ERRORS),
        }
    }
}

impl IArchiveBackend for SaveDataArchive {
    fn name(&self) -> String {
        format!("SaveDataArchive: {}", self.host.mount_point().display())
    }

    fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage> {
        self.host.open_file(path, mode)
    }

    fn delete_file(&self, path: &FsPath) -> FsResult<()> {
        self.host.delete_file(path)
    }

    fn rename_file(&self, src: &FsPath, dest: &FsPath) -> FsResult<()> {
        self.host.rename(src, dest, false)
    }

    fn delete_directory(&self, path: &FsPath) -> FsResult<()> {
        self.host.delete_directory(path, false)
    }

    fn delete_directory_recursively(&self, path: &FsPath) -> FsResult<()> {
        self.host.delete_directory(path, true)
    }

    fn create_file(&self, path: &FsPath, size: u64) -> FsResult<()> {
        self.host.create_file(path, size)
    }

    fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        self.host.create_directory(path)
    }

    fn rename_directory(&self, src: &FsPath, dest: &FsPath) -> FsResult<()> {
        self.host.rename(src, dest, true)
    }

    fn open_directory(&self, path: &FsPath) -> FsResult<DirectoryListing> {
        self.host.open_directory(path)
    }

    fn free_bytes(&self) -> u64 {
        HOST_FREE_BYTES
    }
}

/// `[media type, low, high]`, all little endian u32. The permitted flavour
/// stores a unique id where the low word would be.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct SaveDataArchivePath {
    pub media_type: u32,
    pub low: u32,
    pub high: u32,
}

impl SaveDataArchivePath {
    pub fn parse(path: &FsPath) -> FsResult<Self> {
        parse_binary_path::<Self, 12>(path)
    }

    pub fn media(&self) -> FsResult<MediaType> {
        MediaType::try_from(self.media_type)
    }
}

/// Where save data for any title lives on the SD card.
#[derive(Debug, Clone)]
pub(crate) struct SdSaveDataSource {
    sdmc_directory: PathBuf,
}

impl SdSaveDataSource {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            sdmc_directory: config.sdmc_id_directory(),
        }
    }

    fn data_directory(&self, program_id: ProgramId) -> PathBuf {
        self.sdmc_directory
            .join("title")
            .join(format!("{:08x}", program_id.high()))
            .join(format!("{:08x}", program_id.low()))
            .join("data")
    }

    pub fn save_path(&self, program_id: ProgramId) -> PathBuf {
        self.data_directory(program_id).join("00000001")
    }

    pub fn metadata_path(&self, program_id: ProgramId) -> PathBuf {
        self.data_directory(program_id).join("00000001.metadata")
    }

    pub fn open(&self, program_id: ProgramId) -> FsResult<ArchiveBackend> {
        let path = self.save_path(program_id);
        if !path.is_dir() {
            // the title creates its save data itself once it sees this
            log::warn!("save data for {program_id} not found at {}", path.display());
            return Err(ERR_NOT_FORMATTED.into());
        }
        Ok(SaveDataArchive::new(path).into())
    }

    pub fn format(&self, program_id: ProgramId, info: &ArchiveFormatInfo) -> FsResult<()> {
        log::info!("formatting save data for {program_id}");
        recreate_dir(&self.save_path(program_id))?;
        info.store(&self.metadata_path(program_id))
    }

    pub fn format_info(&self, program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        ArchiveFormatInfo::load(&self.metadata_path(program_id))
    }
}

/// Save data of the running title.
#[derive(Debug, Clone)]
pub struct SaveDataFactory {
    source: SdSaveDataSource,
}

impl SaveDataFactory {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            source: SdSaveDataSource::new(config),
        }
    }
}

impl IArchiveFactory for SaveDataFactory {
    fn name(&self) -> String {
        "SaveData".into()
    }

    fn open(&mut self, path: &FsPath, program_id: ProgramId) -> FsResult<ArchiveBackend> {
        path.require_empty()?;
        self.source.open(program_id)
    }

    fn format(
        &mut self,
        path: &FsPath,
        info: &ArchiveFormatInfo,
        program_id: ProgramId,
    ) -> FsResult<()> {
        path.require_empty()?;
        self.source.format(program_id, info)
    }

    fn format_info(&self, path: &FsPath, program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        path.require_empty()?;
        self.source.format_info(program_id)
    }
}

fn reject_game_card(media: MediaType) -> FsResult<()> {
    if media == MediaType::GameCard {
        log::warn!("save data on the game card is not supported");
        return Err(ERROR_GAMECARD_NOT_INSERTED.into());
    }
    Ok(())
}

/// Program id the permitted flavour derives from a unique id.
fn permitted_program_id(unique_id: u32) -> ProgramId {
    ProgramId(0x0004_0000_0000_0000 | (u64::from(unique_id) << 8))
}

/// Save data of any title, addressed by its full program id.
#[derive(Debug, Clone)]
pub struct OtherSaveDataGeneralFactory {
    source: SdSaveDataSource,
}

impl OtherSaveDataGeneralFactory {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            source: SdSaveDataSource::new(config),
        }
    }

    fn parse(path: &FsPath) -> FsResult<ProgramId> {
        let parsed = SaveDataArchivePath::parse(path)?;
        reject_game_card(parsed.media()?)?;
        Ok(ProgramId::from_parts(parsed.high, parsed.low))
    }
}

impl IArchiveFactory for OtherSaveDataGeneralFactory {
    fn name(&self) -> String {
        "OtherSaveDataGeneral".into()
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        self.source.open(Self::parse(path)?)
    }

    fn format(
        &mut self,
        path: &FsPath,
        info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        self.source.format(Self::parse(path)?, info)
    }

    fn format_info(&self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        self.source.format_info(Self::parse(path)?)
    }
}

/// Save data of a title that shares the caller's unique id. Can be opened and
/// queried but not formatted.
#[derive(Debug, Clone)]
pub struct OtherSaveDataPermittedFactory {
    source: SdSaveDataSource,
}

impl OtherSaveDataPermittedFactory {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            source: SdSaveDataSource::new(config),
        }
    }

    fn parse(path: &FsPath) -> FsResult<ProgramId> {
        let parsed = SaveDataArchivePath::parse(path)?;
        reject_game_card(parsed.media()?)?;
        Ok(permitted_program_id(parsed.low))
    }
}

impl IArchiveFactory for OtherSaveDataPermittedFactory {
    fn name(&self) -> String {
        "OtherSaveDataPermitted".into()
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        self.source.open(Self::parse(path)?)
    }

    fn format(
        &mut self,
        _path: &FsPath,
        _info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        log::error!("attempted to format an OtherSaveDataPermitted archive");
        Err(ERROR_INVALID_PATH.into())
    }

    fn format_info(&self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        self.source.format_info(Self::parse(path)?)
    }
}

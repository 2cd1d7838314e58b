//! Extended save data, shared between titles. Lives on the SD card, or in
//! NAND for the shared flavour used by system applets.

use super::{
    host::{HostDirectory, SAVE_DATA_ERRORS},
    recreate_dir,
    savedata::SaveDataArchivePath,
    ArchiveBackend, ArchiveFormatInfo, IArchiveBackend, IArchiveFactory,
};
use crate::{
    common::{MediaType, ProgramId},
    config::FsConfig,
    directory::DirectoryListing,
    error::{
        ERROR_ALREADY_EXISTS, ERROR_NOT_FOUND, ERROR_UNSUPPORTED_OPEN_FLAGS,
        ERR_NOT_FORMATTED, ERR_NOT_FOUND_INVALID_STATE,
    },
    file::Mode,
    path::FsPath,
    storage::Storage,
    FsResult,
};
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct ExtSaveDataArchive {
    host: HostDirectory,
}

impl ExtSaveDataArchive {
    pub fn new(mount_point: PathBuf) -> Self {
        Self {
            host: HostDirectory::new(mount_point, &SAVE_DATA_ERRORS),
        }
    }
}

impl IArchiveBackend for ExtSaveDataArchive {
    fn name(&self) -> String {
        format!("ExtSaveDataArchive: {}", self.host.mount_point().display())
    }

    fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage> {
        if mode.create() {
            log::error!("ext save data does not support the create flag, path {path}");
            return Err(ERROR_UNSUPPORTED_OPEN_FLAGS.into());
        }
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
        // the quota recorded in the format info isn't tracked
        0
    }
}

/// Binary path addressing ext save data `(high, low)` on `media`.
pub fn ext_save_data_path(media: MediaType, high: u32, low: u32) -> FsPath {
    let mut raw = Vec::with_capacity(12);
    for word in [media as u32, low, high] {
        raw.extend_from_slice(&word.to_le_bytes());
    }
    FsPath::binary(raw)
}

/// Both ext save data categories. Which one is decided by `shared`, which
/// also moves the container from the SD card to NAND.
#[derive(Debug, Clone)]
pub struct ExtSaveDataFactory {
    container: PathBuf,
    shared: bool,
}

impl ExtSaveDataFactory {
    pub fn new(config: &FsConfig, shared: bool) -> Self {
        let container = if shared {
            config.nand_id_directory().join("extdata")
        } else {
            config.sdmc_id_directory().join("extdata")
        };
        Self { container, shared }
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// `<container>/<HIGH>/<LOW>/`
    fn location(&self, path: &FsPath) -> FsResult<PathBuf> {
        let parsed = SaveDataArchivePath::parse(path)?;
        Ok(self
            .container
            .join(format!("{:08X}", parsed.high))
            .join(format!("{:08X}", parsed.low)))
    }

    pub fn exists(&self, path: &FsPath) -> FsResult<bool> {
        Ok(self.location(path)?.is_dir())
    }

    /// Brings a new location into existence, failing if it is already there.
    pub fn create(&self, path: &FsPath, info: &ArchiveFormatInfo, icon: &[u8]) -> FsResult<()> {
        let location = self.location(path)?;
        if location.exists() {
            log::error!("ext save data {} already exists", location.display());
            return Err(ERROR_ALREADY_EXISTS.into());
        }

        let created = self
            .provision(path, info)
            .and_then(|()| self.write_icon(path, icon));
        if created.is_err() {
            // leave nothing half made behind
            if let Err(e) = fs::remove_dir_all(&location) {
                log::warn!("cleaning up {} failed: {e}", location.display());
            }
        }
        created
    }

    fn provision(&self, path: &FsPath, info: &ArchiveFormatInfo) -> FsResult<()> {
        let location = self.location(path)?;
        recreate_dir(&location.join("user"))?;
        recreate_dir(&location.join("boss"))?;
        info.store(&location.join("metadata"))
    }

    pub fn write_icon(&self, path: &FsPath, icon: &[u8]) -> FsResult<()> {
        let location = self.location(path)?;
        fs::write(location.join("icon"), icon)?;
        Ok(())
    }

    pub fn delete(&self, path: &FsPath) -> FsResult<()> {
        let location = self.location(path)?;
        if !location.is_dir() {
            log::error!("ext save data {} not found", location.display());
            return Err(ERROR_NOT_FOUND.into());
        }
        fs::remove_dir_all(location)?;
        Ok(())
    }
}

impl IArchiveFactory for ExtSaveDataFactory {
    fn name(&self) -> String {
        if self.shared {
            "SharedExtSaveData".into()
        } else {
            "ExtSaveData".into()
        }
    }

    fn initialize(&mut self) -> FsResult<()> {
        fs::create_dir_all(&self.container).map_err(|e| {
            log::error!(
                "unable to create ext save data container {}: {e}",
                self.container.display()
            );
            e
        })?;
        Ok(())
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        let user = self.location(path)?.join("user");
        if !user.is_dir() {
            log::warn!("ext save data {} not found", user.display());
            // shared ext save data is created by the system, the normal
            // flavour by the title
            return Err(if self.shared {
                ERR_NOT_FORMATTED
            } else {
                ERR_NOT_FOUND_INVALID_STATE
            }
            .into());
        }
        Ok(ExtSaveDataArchive::new(user).into())
    }

    fn format(
        &mut self,
        path: &FsPath,
        info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        self.provision(path, info)
    }

    fn format_info(&self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        ArchiveFormatInfo::load(&self.location(path)?.join("metadata"))
    }
}

//! Save data of system modules, kept in NAND.

use super::{
    parse_binary_path, recreate_dir, savedata::SaveDataArchive, ArchiveBackend,
    ArchiveFormatInfo, IArchiveFactory,
};
use crate::{
    common::ProgramId,
    config::FsConfig,
    error::{ERROR_ALREADY_EXISTS, ERROR_NOT_FOUND, ERR_NOT_FORMATTED},
    path::FsPath,
    FsResult,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// `[high, low]`, little endian u32 each.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
struct SystemSaveDataPath {
    high: u32,
    low: u32,
}

/// Binary path addressing system save data `(high, low)`.
pub fn system_save_data_path(high: u32, low: u32) -> FsPath {
    let mut raw = [0; 8];
    raw[..4].copy_from_slice(&high.to_le_bytes());
    raw[4..].copy_from_slice(&low.to_le_bytes());
    FsPath::binary(raw)
}

#[derive(Debug, Clone)]
pub struct SystemSaveDataFactory {
    base: PathBuf,
}

impl SystemSaveDataFactory {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            base: config.nand_id_directory().join("sysdata"),
        }
    }

    /// `<base>/<LOW>/<HIGH>/`. The low word is the save id, the high word is
    /// zero for everything the system ships.
    fn location(&self, path: &FsPath) -> FsResult<PathBuf> {
        let parsed: SystemSaveDataPath = parse_binary_path::<_, 8>(path)?;
        Ok(self
            .base
            .join(format!("{:08X}", parsed.low))
            .join(format!("{:08X}", parsed.high)))
    }

    fn metadata_path(location: &Path) -> PathBuf {
        location.with_extension("metadata")
    }

    pub fn exists(&self, path: &FsPath) -> FsResult<bool> {
        Ok(self.location(path)?.is_dir())
    }

    pub fn create(&self, path: &FsPath) -> FsResult<()> {
        let location = self.location(path)?;
        if location.exists() {
            log::error!("system save data {} already exists", location.display());
            return Err(ERROR_ALREADY_EXISTS.into());
        }
        fs::create_dir_all(location)?;
        Ok(())
    }

    pub fn delete(&self, path: &FsPath) -> FsResult<()> {
        let location = self.location(path)?;
        if !location.is_dir() {
            log::error!("system save data {} not found", location.display());
            return Err(ERROR_NOT_FOUND.into());
        }
        fs::remove_dir_all(&location)?;

        match fs::remove_file(Self::metadata_path(&location)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl IArchiveFactory for SystemSaveDataFactory {
    fn name(&self) -> String {
        "SystemSaveData".into()
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        let location = self.location(path)?;
        if !location.is_dir() {
            // the system module creates it on first boot
            log::warn!("system save data {} not found", location.display());
            return Err(ERR_NOT_FORMATTED.into());
        }
        Ok(SaveDataArchive::new(location).into())
    }

    fn format(
        &mut self,
        path: &FsPath,
        info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        let location = self.location(path)?;
        recreate_dir(&location)?;
        info.store(&Self::metadata_path(&location))
    }

    fn format_info(&self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        ArchiveFormatInfo::load(&Self::metadata_path(&self.location(path)?))
    }
}

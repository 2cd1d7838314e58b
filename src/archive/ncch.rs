//! Read only archives over application content: the running title's own
//! container, and installed or inserted titles by program id.

use super::{parse_binary_path, ArchiveBackend, ArchiveFormatInfo, IArchiveBackend, IArchiveFactory};
use crate::{
    common::{MediaType, ProgramId},
    directory::DirectoryListing,
    error::{
        ERROR_COMMAND_NOT_ALLOWED, ERROR_EXEFS_SECTION_NOT_FOUND, ERROR_GAMECARD_NOT_INSERTED,
        ERROR_INVALID_PATH, ERROR_NOT_FOUND, ERROR_ROMFS_NOT_FOUND, ERROR_UNSUPPORTED_OPEN_FLAGS,
    },
    file::Mode,
    loader::AppLoader,
    path::FsPath,
    storage::{Storage, VecStorage},
    FsResult,
};
use bstr::ByteSlice;
use std::collections::BTreeMap;

/// The parts of an application container reachable through the archive.
/// Anything the loader could not provide is `None`.
#[derive(Debug, Clone, Default)]
pub struct NcchData {
    pub romfs: Option<Storage>,
    pub update_romfs: Option<Storage>,
    pub code: Option<Vec<u8>>,
    pub icon: Option<Vec<u8>>,
    pub banner: Option<Vec<u8>>,
    pub logo: Option<Vec<u8>>,
}

impl NcchData {
    pub fn from_loader(loader: &dyn AppLoader) -> Self {
        fn part<T>(what: &str, res: FsResult<T>) -> Option<T> {
            res.map_err(|e| log::debug!("application provides no {what}: {e}"))
                .ok()
        }

        Self {
            romfs: part("RomFS", loader.read_romfs()),
            update_romfs: part("update RomFS", loader.read_update_romfs()),
            code: part("code", loader.read_code()),
            icon: part("icon", loader.read_icon()),
            banner: part("banner", loader.read_banner()),
            logo: part("logo", loader.read_logo()),
        }
    }

    fn romfs(&self, update: bool) -> FsResult<Storage> {
        let romfs = if update {
            &self.update_romfs
        } else {
            &self.romfs
        };
        romfs.clone().ok_or_else(|| {
            log::info!("unable to read {}RomFS", if update { "update " } else { "" });
            ERROR_ROMFS_NOT_FOUND.into()
        })
    }

    fn exefs_section(&self, name: &[u8; 8]) -> FsResult<Storage> {
        let end = name.find_byte(0).unwrap_or(name.len());
        let name = &name[..end];

        let section = match name {
            b"icon" => &self.icon,
            b"banner" => &self.banner,
            b"logo" => &self.logo,
            b".code" => &self.code,
            _ => {
                log::error!("unknown ExeFS file {}", name.as_bstr());
                return Err(ERROR_INVALID_PATH.into());
            }
        };

        match section {
            Some(buf) => Ok(VecStorage::new(buf.clone())),
            None => {
                log::warn!("ExeFS section {} not found", name.as_bstr());
                Err(ERROR_EXEFS_SECTION_NOT_FOUND.into())
            }
        }
    }
}

/// File path inside the running title's own container.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
struct SelfNcchFilePath {
    ty: u32,
    exefs_filename: [u8; 8],
}

/// File path inside another title's container.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
struct NcchFilePath {
    open_type: u32,
    content_index: u32,
    ty: u32,
    exefs_filename: [u8; 8],
}

/// Archive path of the NCCH category.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
struct NcchArchivePath {
    program_id: u64,
    media_type: u32,
    _reserved: u32,
}

#[derive(Debug, Clone)]
pub struct NcchArchive {
    data: NcchData,
    program_id: ProgramId,
    /// the running title's own container
    own: bool,
}

impl NcchArchive {
    pub fn new(data: NcchData, program_id: ProgramId, own: bool) -> Self {
        Self {
            data,
            program_id,
            own,
        }
    }

    fn read_only<T>(&self, what: &str, path: &FsPath) -> FsResult<T> {
        log::error!("{what} {path} is not supported on {}", self.name());
        Err(ERROR_UNSUPPORTED_OPEN_FLAGS.into())
    }
}

impl IArchiveBackend for NcchArchive {
    fn name(&self) -> String {
        if self.own {
            format!("SelfNCCHArchive: {}", self.program_id)
        } else {
            format!("NCCHArchive: {}", self.program_id)
        }
    }

    fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage> {
        if mode.write() {
            return self.read_only("writing to", path);
        }

        let (ty, exefs_filename) = if self.own {
            let parsed: SelfNcchFilePath = parse_binary_path::<_, 12>(path)?;
            (parsed.ty, parsed.exefs_filename)
        } else {
            let parsed: NcchFilePath = parse_binary_path::<_, 20>(path)?;
            log::trace!(
                "open type {} content index {}",
                parsed.open_type,
                parsed.content_index
            );
            (parsed.ty, parsed.exefs_filename)
        };

        match ty {
            0 => self.data.romfs(false),
            1 if self.own => {
                log::error!("reading the code section of the running title is not supported");
                Err(ERROR_COMMAND_NOT_ALLOWED.into())
            }
            1 => self.data.exefs_section(b".code\0\0\0"),
            2 => self.data.exefs_section(&exefs_filename),
            5 if self.own => self.data.romfs(true),
            other => {
                log::error!("unknown file path type {other}");
                Err(ERROR_INVALID_PATH.into())
            }
        }
    }

    fn delete_file(&self, path: &FsPath) -> FsResult<()> {
        self.read_only("deleting", path)
    }

    fn rename_file(&self, src: &FsPath, _dest: &FsPath) -> FsResult<()> {
        self.read_only("renaming", src)
    }

    fn delete_directory(&self, path: &FsPath) -> FsResult<()> {
        self.read_only("deleting", path)
    }

    fn delete_directory_recursively(&self, path: &FsPath) -> FsResult<()> {
        self.read_only("deleting", path)
    }

    fn create_file(&self, path: &FsPath, _size: u64) -> FsResult<()> {
        self.read_only("creating", path)
    }

    fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        self.read_only("creating", path)
    }

    fn rename_directory(&self, src: &FsPath, _dest: &FsPath) -> FsResult<()> {
        self.read_only("renaming", src)
    }

    fn open_directory(&self, path: &FsPath) -> FsResult<DirectoryListing> {
        self.read_only("listing", path)
    }

    fn free_bytes(&self) -> u64 {
        0
    }
}

fn refuse_format<T>(name: &str) -> FsResult<T> {
    log::error!("attempted to format or query a {name} archive");
    Err(ERROR_INVALID_PATH.into())
}

/// The running title's own container. Unusable until a title registers.
#[derive(Debug, Clone, Default)]
pub struct SelfNcchFactory {
    titles: BTreeMap<ProgramId, NcchData>,
}

impl SelfNcchFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, program_id: ProgramId, data: NcchData) {
        log::debug!("registering program {program_id} with SelfNCCH");
        if self.titles.insert(program_id, data).is_some() {
            log::warn!("registering program {program_id} with SelfNCCH overrides the existing mapping");
        }
    }

    pub fn is_registered(&self, program_id: ProgramId) -> bool {
        self.titles.contains_key(&program_id)
    }
}

impl IArchiveFactory for SelfNcchFactory {
    fn name(&self) -> String {
        "SelfNCCH".into()
    }

    fn open(&mut self, path: &FsPath, program_id: ProgramId) -> FsResult<ArchiveBackend> {
        path.require_empty()?;
        let data = self.titles.get(&program_id).ok_or_else(|| {
            log::error!("no application registered with SelfNCCH for {program_id}");
            ERROR_NOT_FOUND
        })?;
        Ok(NcchArchive::new(data.clone(), program_id, true).into())
    }

    fn format(
        &mut self,
        _path: &FsPath,
        _info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        refuse_format("SelfNCCH")
    }

    fn format_info(&self, _path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        refuse_format("SelfNCCH")
    }
}

/// Content of titles other than the running one, by program id and medium.
#[derive(Debug, Clone, Default)]
pub struct NcchFactory {
    titles: BTreeMap<(ProgramId, MediaType), NcchData>,
}

impl NcchFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, program_id: ProgramId, media: MediaType, data: NcchData) {
        log::debug!("registering program {program_id} on {media} with NCCH");
        self.titles.insert((program_id, media), data);
    }
}

/// Archive path addressing `program_id` on `media` through the NCCH category.
pub fn ncch_archive_path(program_id: ProgramId, media: MediaType) -> FsPath {
    let mut raw = Vec::with_capacity(16);
    raw.extend_from_slice(&program_id.0.to_le_bytes());
    raw.extend_from_slice(&(media as u32).to_le_bytes());
    raw.extend_from_slice(&0u32.to_le_bytes());
    FsPath::binary(raw)
}

impl IArchiveFactory for NcchFactory {
    fn name(&self) -> String {
        "NCCH".into()
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        let parsed: NcchArchivePath = parse_binary_path::<_, 16>(path)?;
        let program_id = ProgramId(parsed.program_id);
        let media = MediaType::try_from(parsed.media_type)?;

        match self.titles.get(&(program_id, media)) {
            Some(data) => Ok(NcchArchive::new(data.clone(), program_id, false).into()),
            None if media == MediaType::GameCard => {
                log::warn!("no game card with {program_id} inserted");
                Err(ERROR_GAMECARD_NOT_INSERTED.into())
            }
            None => {
                log::error!("title {program_id} not found on {media}");
                Err(ERROR_NOT_FOUND.into())
            }
        }
    }

    fn format(
        &mut self,
        _path: &FsPath,
        _info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        refuse_format("NCCH")
    }

    fn format_info(&self, _path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        refuse_format("NCCH")
    }
}

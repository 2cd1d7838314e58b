//! The archive manager: which factory serves which category, which archives
//! are open under which handle, and the operations dispatched through both.

use crate::{
    archive::{
        ext_save_data_path, system_save_data_path, ArchiveBackend, ArchiveFactory,
        ArchiveFormatInfo, ExtSaveDataFactory, IArchiveBackend, IArchiveFactory, NcchData,
        NcchFactory, OtherSaveDataGeneralFactory, OtherSaveDataPermittedFactory, SaveDataFactory,
        SdmcFactory, SdmcWriteOnlyFactory, SelfNcchFactory, SystemSaveDataFactory,
    },
    common::{ArchiveHandle, ArchiveIdCode, MediaType, ProgramId},
    config::FsConfig,
    directory::Directory,
    error::ERROR_INVALID_ENUM_VALUE,
    file::{ArchiveLease, File, Mode},
    loader::AppLoader,
    path::FsPath,
    FsError, FsResult,
};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug)]
struct OpenArchive {
    backend: ArchiveBackend,
    id_code: ArchiveIdCode,
    /// Files and directories opened from this archive hold weak references
    /// to it and stop working once it is dropped on close.
    token: Arc<()>,
}

fn make_factory(config: &FsConfig, id_code: ArchiveIdCode) -> ArchiveFactory {
    use ArchiveIdCode::*;
    match id_code {
        SelfNcch => SelfNcchFactory::new().into(),
        SaveData => SaveDataFactory::new(config).into(),
        ExtSaveData => ExtSaveDataFactory::new(config, false).into(),
        SharedExtSaveData => ExtSaveDataFactory::new(config, true).into(),
        SystemSaveData => SystemSaveDataFactory::new(config).into(),
        Sdmc => SdmcFactory::new(config).into(),
        SdmcWriteOnly => SdmcWriteOnlyFactory::new(config).into(),
        Ncch => NcchFactory::new().into(),
        OtherSaveDataGeneral => OtherSaveDataGeneralFactory::new(config).into(),
        OtherSaveDataPermitted => OtherSaveDataPermittedFactory::new(config).into(),
    }
}

/// Owns one factory per registered category and every open archive.
///
/// Nothing in here locks. Callers dispatching from several threads have to
/// serialize access themselves, e.g. by keeping the manager in a mutex.
#[derive(Debug)]
pub struct ArchiveManager {
    config: FsConfig,
    id_code_map: BTreeMap<ArchiveIdCode, ArchiveFactory>,
    handle_map: BTreeMap<ArchiveHandle, OpenArchive>,
    next_handle: ArchiveHandle,
    program_id: ProgramId,
}

impl ArchiveManager {
    /// A manager serving every known category.
    pub fn new(config: FsConfig) -> FsResult<Self> {
        Self::with_archive_types(config, &ArchiveIdCode::ALL)
    }

    /// A manager serving only `id_codes`. Listing a category twice is an
    /// error.
    pub fn with_archive_types(config: FsConfig, id_codes: &[ArchiveIdCode]) -> FsResult<Self> {
        let mut manager = Self {
            config,
            id_code_map: BTreeMap::new(),
            handle_map: BTreeMap::new(),
            next_handle: ArchiveHandle::FIRST,
            program_id: ProgramId::default(),
        };

        for &id_code in id_codes {
            manager.register_archive_type(id_code)?;
        }

        Ok(manager)
    }

    fn register_archive_type(&mut self, id_code: ArchiveIdCode) -> FsResult<()> {
        if self.id_code_map.contains_key(&id_code) {
            log::error!("tried to register more than one archive for {id_code}");
            return Err(FsError::AlreadyRegistered(id_code));
        }

        let mut factory = make_factory(&self.config, id_code);
        if let Err(e) = factory.initialize() {
            // the category stays unavailable, everything else still works
            log::error!("can't instantiate the {id_code} archive: {e}");
            return Ok(());
        }

        log::debug!("registered archive {} for {id_code}", factory.name());
        self.id_code_map.insert(id_code, factory);
        Ok(())
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn is_registered(&self, id_code: ArchiveIdCode) -> bool {
        self.id_code_map.contains_key(&id_code)
    }

    /// Title whose save data the SaveData category resolves to.
    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    pub fn set_program_id(&mut self, program_id: ProgramId) {
        self.program_id = program_id;
    }

    pub fn is_open(&self, handle: ArchiveHandle) -> bool {
        self.handle_map.contains_key(&handle)
    }

    /// Resolves `handle` to its open archive. Every handle based operation
    /// goes through here.
    fn get_archive(&self, handle: ArchiveHandle) -> FsResult<&OpenArchive> {
        self.handle_map
            .get(&handle)
            .ok_or(FsError::InvalidArchiveHandle(handle))
    }

    fn factory_mut(&mut self, id_code: ArchiveIdCode) -> FsResult<&mut ArchiveFactory> {
        self.id_code_map.get_mut(&id_code).ok_or_else(|| {
            log::error!("archive {id_code} is not registered");
            FsError::ArchiveNotRegistered(id_code)
        })
    }

    pub fn open_archive(&mut self, id_code: ArchiveIdCode, path: &FsPath) -> FsResult<ArchiveHandle> {
        log::trace!("opening archive {id_code} with path {path}");

        let program_id = self.program_id;
        let handle = self.next_handle;
        let factory = self.factory_mut(id_code)?;
        let next_handle = handle.next().ok_or(FsError::OutOfHandles)?;

        let backend = factory.open(path, program_id)?;
        log::trace!("opened {} as handle {handle}", backend.name());

        self.next_handle = next_handle;
        self.handle_map.insert(
            handle,
            OpenArchive {
                backend,
                id_code,
                token: Arc::new(()),
            },
        );
        Ok(handle)
    }

    /// [`ArchiveManager::open_archive`] with the category as sent on the wire.
    pub fn open_archive_raw(&mut self, id_code: u32, path: &FsPath) -> FsResult<ArchiveHandle> {
        let id_code = ArchiveIdCode::try_from(id_code).map_err(|e| {
            log::error!("{e}");
            e
        })?;
        self.open_archive(id_code, path)
    }

    pub fn close_archive(&mut self, handle: ArchiveHandle) -> FsResult<()> {
        match self.handle_map.remove(&handle) {
            Some(archive) => {
                log::trace!("closed {} archive {handle}", archive.id_code);
                Ok(())
            }
            None => {
                log::error!("tried to close unopened archive {handle}");
                Err(FsError::InvalidArchiveHandle(handle))
            }
        }
    }

    pub fn open_file_from_archive(
        &self,
        handle: ArchiveHandle,
        path: &FsPath,
        mode: Mode,
    ) -> FsResult<File> {
        let archive = self.get_archive(handle)?;
        mode.validate()?;

        let storage = archive.backend.open_file(path, mode)?;
        Ok(File::new(
            storage,
            mode,
            path.clone(),
            ArchiveLease::new(handle, &archive.token),
        ))
    }

    pub fn delete_file_from_archive(&self, handle: ArchiveHandle, path: &FsPath) -> FsResult<()> {
        self.get_archive(handle)?.backend.delete_file(path)
    }

    /// Renames within one archive. Both handles have to be open and the
    /// same, moving a file between two open archives is refused.
    pub fn rename_file_between_archives(
        &self,
        src_handle: ArchiveHandle,
        src_path: &FsPath,
        dest_handle: ArchiveHandle,
        dest_path: &FsPath,
    ) -> FsResult<()> {
        let src = self.get_archive(src_handle)?;
        self.get_archive(dest_handle)?;

        if src_handle != dest_handle {
            log::error!("renaming {src_path} across archives {src_handle} and {dest_handle}");
            return Err(FsError::CrossArchiveRename {
                src: src_handle,
                dest: dest_handle,
            });
        }
        src.backend.rename_file(src_path, dest_path)
    }

    pub fn delete_directory_from_archive(
        &self,
        handle: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        self.get_archive(handle)?.backend.delete_directory(path)
    }

    pub fn delete_directory_recursively_from_archive(
        &self,
        handle: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        self.get_archive(handle)?
            .backend
            .delete_directory_recursively(path)
    }

    pub fn create_file_in_archive(
        &self,
        handle: ArchiveHandle,
        path: &FsPath,
        file_size: u64,
    ) -> FsResult<()> {
        self.get_archive(handle)?
            .backend
            .create_file(path, file_size)
    }

    pub fn create_directory_from_archive(
        &self,
        handle: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        self.get_archive(handle)?.backend.create_directory(path)
    }

    /// Same rules as [`ArchiveManager::rename_file_between_archives`].
    pub fn rename_directory_between_archives(
        &self,
        src_handle: ArchiveHandle,
        src_path: &FsPath,
        dest_handle: ArchiveHandle,
        dest_path: &FsPath,
    ) -> FsResult<()> {
        let src = self.get_archive(src_handle)?;
        self.get_archive(dest_handle)?;

        if src_handle != dest_handle {
            log::error!("renaming {src_path} across archives {src_handle} and {dest_handle}");
            return Err(FsError::CrossArchiveRename {
                src: src_handle,
                dest: dest_handle,
            });
        }
        src.backend.rename_directory(src_path, dest_path)
    }

    pub fn open_directory_from_archive(
        &self,
        handle: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<Directory> {
        let archive = self.get_archive(handle)?;
        let listing = archive.backend.open_directory(path)?;
        Ok(Directory::new(
            listing,
            path.clone(),
            ArchiveLease::new(handle, &archive.token),
        ))
    }

    pub fn get_free_bytes_in_archive(&self, handle: ArchiveHandle) -> FsResult<u64> {
        Ok(self.get_archive(handle)?.backend.free_bytes())
    }

    /// Erases and reprovisions the location `path` refers to. Archives open
    /// on that location are not told about it.
    pub fn format_archive(
        &mut self,
        id_code: ArchiveIdCode,
        info: &ArchiveFormatInfo,
        path: &FsPath,
    ) -> FsResult<()> {
        let program_id = self.program_id;
        self.factory_mut(id_code)?.format(path, info, program_id)
    }

    pub fn get_archive_format_info(
        &self,
        id_code: ArchiveIdCode,
        path: &FsPath,
    ) -> FsResult<ArchiveFormatInfo> {
        let factory = self
            .id_code_map
            .get(&id_code)
            .ok_or(FsError::ArchiveNotRegistered(id_code))?;
        factory.format_info(path, self.program_id)
    }

    fn ext_save_data_factory(&self, media: MediaType) -> FsResult<&ExtSaveDataFactory> {
        let id_code = match media {
            MediaType::Nand => ArchiveIdCode::SharedExtSaveData,
            MediaType::Sdmc => ArchiveIdCode::ExtSaveData,
            MediaType::GameCard => {
                log::error!("ext save data can't live on {media}");
                return Err(ERROR_INVALID_ENUM_VALUE.into());
            }
        };

        match self.id_code_map.get(&id_code) {
            Some(ArchiveFactory::ExtSaveData(factory)) => Ok(factory),
            _ => Err(FsError::ArchiveNotRegistered(id_code)),
        }
    }

    /// Creates ext save data `(high, low)` on `media`, along with its icon.
    /// Fails if it already exists.
    pub fn create_ext_save_data(
        &self,
        media: MediaType,
        high: u32,
        low: u32,
        smdh_icon: &[u8],
        info: &ArchiveFormatInfo,
    ) -> FsResult<()> {
        let factory = self.ext_save_data_factory(media)?;
        factory.create(&ext_save_data_path(media, high, low), info, smdh_icon)
    }

    pub fn delete_ext_save_data(&self, media: MediaType, high: u32, low: u32) -> FsResult<()> {
        let factory = self.ext_save_data_factory(media)?;
        factory.delete(&ext_save_data_path(media, high, low))
    }

    fn system_save_data_factory(&self) -> FsResult<&SystemSaveDataFactory> {
        match self.id_code_map.get(&ArchiveIdCode::SystemSaveData) {
            Some(ArchiveFactory::SystemSaveData(factory)) => Ok(factory),
            _ => Err(FsError::ArchiveNotRegistered(ArchiveIdCode::SystemSaveData)),
        }
    }

    pub fn create_system_save_data(&self, high: u32, low: u32) -> FsResult<()> {
        self.system_save_data_factory()?
            .create(&system_save_data_path(high, low))
    }

    pub fn delete_system_save_data(&self, high: u32, low: u32) -> FsResult<()> {
        self.system_save_data_factory()?
            .delete(&system_save_data_path(high, low))
    }

    /// Makes the freshly loaded application reachable through the SelfNCCH
    /// category and switches the current program id over to it.
    ///
    /// Registering the same program id again replaces its content. Titles
    /// registered earlier under other program ids stay resident, RomFS and
    /// ExeFS buffers included, for as long as the manager lives.
    pub fn register_self_ncch(&mut self, loader: &dyn AppLoader) -> FsResult<()> {
        let Some(ArchiveFactory::SelfNcch(factory)) =
            self.id_code_map.get_mut(&ArchiveIdCode::SelfNcch)
        else {
            log::error!("could not register a new NCCH because the SelfNCCH archive hasn't been created");
            return Err(FsError::ArchiveNotRegistered(ArchiveIdCode::SelfNcch));
        };

        let program_id = loader.read_program_id().unwrap_or_else(|e| {
            // homebrew has no program id
            log::warn!("could not read program id when registering with SelfNCCH: {e}");
            ProgramId::default()
        });

        factory.register(program_id, NcchData::from_loader(loader));
        self.program_id = program_id;
        Ok(())
    }

    /// Makes a title's content reachable through the NCCH category under its
    /// program id on `media`.
    pub fn register_title_content(
        &mut self,
        media: MediaType,
        loader: &dyn AppLoader,
    ) -> FsResult<()> {
        let program_id = loader.read_program_id()?;
        match self.id_code_map.get_mut(&ArchiveIdCode::Ncch) {
            Some(ArchiveFactory::Ncch(factory)) => {
                factory.register(program_id, media, NcchData::from_loader(loader));
                Ok(())
            }
            _ => Err(FsError::ArchiveNotRegistered(ArchiveIdCode::Ncch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archive::ncch_archive_path,
        error::*,
        loader::tests::TestApp,
        result::ErrorSummary,
    };
    use std::fs;

    fn config(dir: &tempfile::TempDir) -> FsConfig {
        let _ = env_logger::builder().is_test(true).try_init();
        FsConfig::new(dir.path().join("nand"), dir.path().join("sdmc"))
    }

    fn manager_with(codes: &[ArchiveIdCode]) -> (tempfile::TempDir, ArchiveManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArchiveManager::with_archive_types(config(&dir), codes).unwrap();
        (dir, manager)
    }

    fn full_manager() -> (tempfile::TempDir, ArchiveManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArchiveManager::new(config(&dir)).unwrap();
        (dir, manager)
    }

    fn info(total_size: u32) -> ArchiveFormatInfo {
        ArchiveFormatInfo {
            total_size,
            number_directories: 8,
            number_files: 16,
            duplicate_data: false,
        }
    }

    #[test]
    fn registers_every_category() {
        let (_dir, manager) = full_manager();
        for code in ArchiveIdCode::ALL {
            assert!(manager.is_registered(code), "{code}");
        }
    }

    #[test]
    fn duplicate_registration_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArchiveManager::with_archive_types(
            config(&dir),
            &[ArchiveIdCode::Sdmc, ArchiveIdCode::SaveData, ArchiveIdCode::Sdmc],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FsError::AlreadyRegistered(ArchiveIdCode::Sdmc)
        ));
        assert_eq!(err.code(), ERROR_ALREADY_EXISTS);
    }

    #[test]
    fn failed_initialize_leaves_category_unregistered() {
        let dir = tempfile::tempdir().unwrap();
        // the SD card "directory" is a file, nothing can be created below it
        fs::write(dir.path().join("sdmc"), b"").unwrap();

        let mut manager = ArchiveManager::new(config(&dir)).unwrap();
        assert!(!manager.is_registered(ArchiveIdCode::Sdmc));
        assert!(manager.is_registered(ArchiveIdCode::SystemSaveData));
        assert_eq!(
            manager
                .open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty)
                .unwrap_err()
                .code(),
            ERROR_NOT_FOUND
        );
    }

    #[test]
    fn handles_strictly_increase() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);

        let mut handles = Vec::new();
        for _ in 0..3 {
            handles.push(manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap());
        }
        assert_eq!(handles, [ArchiveHandle(1), ArchiveHandle(2), ArchiveHandle(3)]);

        manager.close_archive(ArchiveHandle(2)).unwrap();
        let next = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();
        assert_eq!(next, ArchiveHandle(4));
    }

    #[test]
    fn failed_opens_allocate_nothing() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc, ArchiveIdCode::SaveData]);

        let unregistered = manager
            .open_archive(ArchiveIdCode::ExtSaveData, &FsPath::Empty)
            .unwrap_err();
        assert_eq!(unregistered.code(), ERROR_NOT_FOUND);
        assert_eq!(
            manager
                .open_archive_raw(0x1234_5678, &FsPath::Empty)
                .unwrap_err()
                .code(),
            ERROR_NOT_FOUND
        );
        // save data was never formatted
        assert_eq!(
            manager
                .open_archive(ArchiveIdCode::SaveData, &FsPath::Empty)
                .unwrap_err()
                .code(),
            ERR_NOT_FORMATTED
        );
        assert_eq!(
            manager
                .open_archive(ArchiveIdCode::Sdmc, &FsPath::binary([0; 4]))
                .unwrap_err()
                .code(),
            ERROR_INVALID_PATH
        );

        assert_eq!(
            manager.open_archive_raw(0x9, &FsPath::Empty).unwrap(),
            ArchiveHandle(1)
        );
    }

    #[test]
    fn closed_handles_are_rejected_everywhere() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        let handle = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();
        manager.close_archive(handle).unwrap();
        assert!(!manager.is_open(handle));

        let path = FsPath::text("/x");
        let results = [
            manager.close_archive(handle).err(),
            manager.delete_file_from_archive(handle, &path).err(),
            manager.create_file_in_archive(handle, &path, 0).err(),
            manager.create_directory_from_archive(handle, &path).err(),
            manager.delete_directory_from_archive(handle, &path).err(),
            manager
                .delete_directory_recursively_from_archive(handle, &path)
                .err(),
            manager
                .rename_file_between_archives(handle, &path, handle, &path)
                .err(),
            manager
                .rename_directory_between_archives(handle, &path, handle, &path)
                .err(),
            manager.open_file_from_archive(handle, &path, Mode::READ).err(),
            manager.open_directory_from_archive(handle, &path).err(),
            manager.get_free_bytes_in_archive(handle).err(),
        ];

        for err in results {
            let err = err.expect("operation on a closed handle succeeded");
            assert_eq!(err.code(), ERR_INVALID_ARCHIVE_HANDLE);
            assert_eq!(err.summary(), ErrorSummary::NotFound);
        }
    }

    #[test]
    fn handle_zero_is_never_valid() {
        let (_dir, manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        assert_eq!(
            manager
                .get_free_bytes_in_archive(ArchiveHandle::INVALID)
                .unwrap_err()
                .code(),
            ERR_INVALID_ARCHIVE_HANDLE
        );
    }

    #[test]
    fn running_out_of_handles() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        manager.next_handle = ArchiveHandle(u64::MAX);

        let err = manager
            .open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty)
            .unwrap_err();
        assert!(matches!(err, FsError::OutOfHandles));
        assert_eq!(err.code(), ERROR_OUT_OF_HANDLES);
        assert!(manager.handle_map.is_empty());

        // an unregistered category is still reported as such
        let err = manager
            .open_archive(ArchiveIdCode::SaveData, &FsPath::Empty)
            .unwrap_err();
        assert_eq!(err.code(), ERROR_NOT_FOUND);
        assert_eq!(err.summary(), ErrorSummary::NotFound);
        assert!(manager.handle_map.is_empty());
    }

    #[test]
    fn save_data_and_sdmc_scenario() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::SaveData, ArchiveIdCode::Sdmc]);
        manager
            .format_archive(ArchiveIdCode::SaveData, &info(0x1000), &FsPath::Empty)
            .unwrap();

        let sdmc = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();
        assert_eq!(sdmc, ArchiveHandle(1));
        let save = manager
            .open_archive(ArchiveIdCode::SaveData, &FsPath::Empty)
            .unwrap();
        assert_eq!(save, ArchiveHandle(2));

        manager.close_archive(sdmc).unwrap();

        let x = FsPath::text("/x");
        let closed = manager.delete_file_from_archive(sdmc, &x).unwrap_err();
        assert_eq!(closed.summary(), ErrorSummary::NotFound);
        assert_eq!(closed.code(), ERR_INVALID_ARCHIVE_HANDLE);

        let missing = manager.delete_file_from_archive(save, &x).unwrap_err();
        assert_eq!(missing.code(), ERROR_FILE_NOT_FOUND);
        assert_eq!(missing.summary(), ErrorSummary::NotFound);
        assert!(manager.is_open(save));
    }

    #[test]
    fn format_info_reflects_the_last_format() {
        let (_dir, mut manager) = full_manager();

        assert_eq!(
            manager
                .get_archive_format_info(ArchiveIdCode::SaveData, &FsPath::Empty)
                .unwrap_err()
                .code(),
            ERR_NOT_FORMATTED
        );

        for size in [0x1000, 0x2000] {
            manager
                .format_archive(ArchiveIdCode::SaveData, &info(size), &FsPath::Empty)
                .unwrap();
            assert_eq!(
                manager
                    .get_archive_format_info(ArchiveIdCode::SaveData, &FsPath::Empty)
                    .unwrap(),
                info(size)
            );
        }

        // works with an archive open on the location too
        let handle = manager
            .open_archive(ArchiveIdCode::SaveData, &FsPath::Empty)
            .unwrap();
        assert!(manager.is_open(handle));
        assert_eq!(
            manager
                .get_archive_format_info(ArchiveIdCode::SaveData, &FsPath::Empty)
                .unwrap(),
            info(0x2000)
        );

        let sys = system_save_data_path(0, 0x0001_0026);
        manager
            .format_archive(ArchiveIdCode::SystemSaveData, &info(0x40), &sys)
            .unwrap();
        assert_eq!(
            manager
                .get_archive_format_info(ArchiveIdCode::SystemSaveData, &sys)
                .unwrap(),
            info(0x40)
        );
    }

    #[test]
    fn format_refusals() {
        let (_dir, mut manager) = full_manager();
        let sdmc = manager
            .format_archive(ArchiveIdCode::Sdmc, &info(0), &FsPath::Empty)
            .unwrap_err();
        assert_eq!(sdmc.code(), ERROR_COMMAND_NOT_ALLOWED);

        let self_ncch = manager
            .format_archive(ArchiveIdCode::SelfNcch, &info(0), &FsPath::Empty)
            .unwrap_err();
        assert_eq!(self_ncch.code(), ERROR_INVALID_PATH);

        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        assert_eq!(
            manager
                .format_archive(ArchiveIdCode::SaveData, &info(0), &FsPath::Empty)
                .unwrap_err()
                .code(),
            ERROR_NOT_FOUND
        );
    }

    #[test]
    fn ext_save_data_lifecycle() {
        let (_dir, mut manager) = full_manager();
        let (high, low) = (0, 0x0000_1234);

        assert_eq!(
            manager
                .delete_ext_save_data(MediaType::Sdmc, high, low)
                .unwrap_err()
                .code(),
            ERROR_NOT_FOUND
        );

        manager
            .create_ext_save_data(MediaType::Sdmc, high, low, b"icon", &info(0x100))
            .unwrap();
        assert_eq!(
            manager
                .create_ext_save_data(MediaType::Sdmc, high, low, b"icon", &info(0x100))
                .unwrap_err()
                .code(),
            ERROR_ALREADY_EXISTS
        );

        let path = ext_save_data_path(MediaType::Sdmc, high, low);
        let handle = manager.open_archive(ArchiveIdCode::ExtSaveData, &path).unwrap();
        assert_eq!(manager.get_free_bytes_in_archive(handle).unwrap(), 0);
        assert_eq!(
            manager
                .get_archive_format_info(ArchiveIdCode::ExtSaveData, &path)
                .unwrap(),
            info(0x100)
        );
        manager.close_archive(handle).unwrap();

        manager.delete_ext_save_data(MediaType::Sdmc, high, low).unwrap();
        assert_eq!(
            manager
                .open_archive(ArchiveIdCode::ExtSaveData, &path)
                .unwrap_err()
                .code(),
            ERR_NOT_FOUND_INVALID_STATE
        );
        manager
            .create_ext_save_data(MediaType::Sdmc, high, low, b"icon", &info(0x100))
            .unwrap();
    }

    #[test]
    fn ext_save_data_media() {
        let (dir, manager) = full_manager();

        manager
            .create_ext_save_data(MediaType::Nand, 0x0004_8000, 0xf000_000b, &[], &info(0))
            .unwrap();
        assert!(dir
            .path()
            .join("nand/data")
            .join(crate::common::SYSTEM_ID)
            .join("extdata/00048000/F000000B/user")
            .is_dir());
        assert!(manager
            .ext_save_data_factory(MediaType::Nand)
            .unwrap()
            .is_shared());

        assert_eq!(
            manager
                .create_ext_save_data(MediaType::GameCard, 0, 1, &[], &info(0))
                .unwrap_err()
                .code(),
            ERROR_INVALID_ENUM_VALUE
        );
    }

    #[test]
    fn system_save_data_lifecycle() {
        let (_dir, mut manager) = full_manager();
        let path = system_save_data_path(0, 0x0001_0017);

        assert_eq!(
            manager
                .open_archive(ArchiveIdCode::SystemSaveData, &path)
                .unwrap_err()
                .code(),
            ERR_NOT_FORMATTED
        );
        assert_eq!(
            manager.delete_system_save_data(0, 0x0001_0017).unwrap_err().code(),
            ERROR_NOT_FOUND
        );

        manager.create_system_save_data(0, 0x0001_0017).unwrap();
        assert_eq!(
            manager.create_system_save_data(0, 0x0001_0017).unwrap_err().code(),
            ERROR_ALREADY_EXISTS
        );
        let handle = manager
            .open_archive(ArchiveIdCode::SystemSaveData, &path)
            .unwrap();
        manager
            .create_file_in_archive(handle, &"/config".into(), 0x10)
            .unwrap();

        manager.delete_system_save_data(0, 0x0001_0017).unwrap();
        manager.create_system_save_data(0, 0x0001_0017).unwrap();
    }

    #[test]
    fn files_and_directories_go_stale_on_close() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        let handle = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();

        manager.create_directory_from_archive(handle, &"/dir".into()).unwrap();
        manager
            .create_file_in_archive(handle, &"/dir/file".into(), 4)
            .unwrap();

        let file = manager
            .open_file_from_archive(handle, &"/dir/file".into(), Mode::READ_WRITE)
            .unwrap();
        assert_eq!(file.write(0, b"abcd", true).unwrap(), 4);
        let mut dir = manager
            .open_directory_from_archive(handle, &"/dir".into())
            .unwrap();
        assert_eq!(dir.read(1).unwrap()[0].name, "file");

        manager.close_archive(handle).unwrap();

        let mut buf = [0; 4];
        assert_eq!(
            file.read(0, &mut buf).unwrap_err().code(),
            ERR_INVALID_ARCHIVE_HANDLE
        );
        assert_eq!(dir.read(1).unwrap_err().code(), ERR_INVALID_ARCHIVE_HANDLE);

        // a new archive over the same location doesn't revive them
        manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();
        assert!(file.size().is_err());
    }

    #[test]
    fn open_flags_are_validated() {
        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        let handle = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();

        for mode in [Mode(0), Mode::CREATE, Mode::READ | Mode::CREATE] {
            assert_eq!(
                manager
                    .open_file_from_archive(handle, &"/f".into(), mode)
                    .unwrap_err()
                    .code(),
                ERROR_INVALID_OPEN_FLAGS
            );
        }

        let file = manager
            .open_file_from_archive(handle, &"/f".into(), Mode::WRITE | Mode::CREATE)
            .unwrap();
        assert_eq!(file.path(), &FsPath::text("/f"));
        assert_eq!(file.archive(), handle);
    }

    #[test]
    fn renames_stay_inside_one_archive() {
        let (dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        let a = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();
        let b = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();

        manager.create_file_in_archive(a, &"/old".into(), 1).unwrap();
        manager.create_directory_from_archive(a, &"/d".into()).unwrap();

        let err = manager
            .rename_file_between_archives(a, &"/old".into(), b, &"/new".into())
            .unwrap_err();
        assert!(matches!(err, FsError::CrossArchiveRename { .. }));
        assert_eq!(err.code(), ERROR_NOT_IMPLEMENTED);
        assert!(dir.path().join("sdmc/old").is_file());

        let err = manager
            .rename_directory_between_archives(a, &"/d".into(), b, &"/e".into())
            .unwrap_err();
        assert_eq!(err.code(), ERROR_NOT_IMPLEMENTED);

        manager
            .rename_file_between_archives(a, &"/old".into(), a, &"/new".into())
            .unwrap();
        manager
            .rename_directory_between_archives(b, &"/d".into(), b, &"/e".into())
            .unwrap();
        assert!(dir.path().join("sdmc/new").is_file());
        assert!(dir.path().join("sdmc/e").is_dir());

        // an unknown destination handle is reported before anything else
        assert_eq!(
            manager
                .rename_file_between_archives(a, &"/new".into(), ArchiveHandle(99), &"/x".into())
                .unwrap_err()
                .code(),
            ERR_INVALID_ARCHIVE_HANDLE
        );
    }

    #[test]
    fn self_ncch_after_registration() {
        let (_dir, mut manager) = full_manager();
        assert_eq!(
            manager
                .open_archive(ArchiveIdCode::SelfNcch, &FsPath::Empty)
                .unwrap_err()
                .code(),
            ERROR_NOT_FOUND
        );

        let app = TestApp::default();
        manager.register_self_ncch(&app).unwrap();
        assert_eq!(manager.program_id(), ProgramId(0x0004_0000_0016_4800));

        let handle = manager
            .open_archive(ArchiveIdCode::SelfNcch, &FsPath::Empty)
            .unwrap();
        // type 0, the RomFS
        let romfs = manager
            .open_file_from_archive(handle, &FsPath::binary([0u8; 12]), Mode::READ)
            .unwrap();
        assert_eq!(romfs.size().unwrap(), app.romfs.len() as u64);

        // the title's own save data is what SaveData now resolves to
        manager
            .format_archive(ArchiveIdCode::SaveData, &info(0x10), &FsPath::Empty)
            .unwrap();
        assert!(manager
            .config()
            .sdmc_id_directory()
            .join("title/00040000/00164800/data/00000001")
            .is_dir());
    }

    fn read_self_romfs(manager: &mut ArchiveManager) -> Vec<u8> {
        let handle = manager
            .open_archive(ArchiveIdCode::SelfNcch, &FsPath::Empty)
            .unwrap();
        let romfs = manager
            .open_file_from_archive(handle, &FsPath::binary([0u8; 12]), Mode::READ)
            .unwrap();
        let mut buf = vec![0; romfs.size().unwrap() as usize];
        romfs.read(0, &mut buf).unwrap();
        manager.close_archive(handle).unwrap();
        buf
    }

    #[test]
    fn self_ncch_rebinds_on_reregistration() {
        let (_dir, mut manager) = full_manager();

        let first = TestApp::default();
        manager.register_self_ncch(&first).unwrap();
        assert_eq!(read_self_romfs(&mut manager), first.romfs);

        let second = TestApp {
            program_id: Some(0x0004_0000_0000_1111),
            romfs: b"second".to_vec(),
            ..TestApp::default()
        };
        manager.register_self_ncch(&second).unwrap();
        assert_eq!(manager.program_id(), ProgramId(0x0004_0000_0000_1111));
        assert_eq!(read_self_romfs(&mut manager), b"second");

        // same program id, new content
        let patched = TestApp {
            romfs: b"patched".to_vec(),
            ..second.clone()
        };
        manager.register_self_ncch(&patched).unwrap();
        assert_eq!(manager.program_id(), ProgramId(0x0004_0000_0000_1111));
        assert_eq!(read_self_romfs(&mut manager), b"patched");
    }

    #[test]
    fn homebrew_registers_as_program_zero() {
        let (_dir, mut manager) = full_manager();
        manager.set_program_id(ProgramId(0x1234));

        let app = TestApp {
            program_id: None,
            ..TestApp::default()
        };
        manager.register_self_ncch(&app).unwrap();
        assert_eq!(manager.program_id(), ProgramId(0));
        assert!(manager
            .open_archive(ArchiveIdCode::SelfNcch, &FsPath::Empty)
            .is_ok());

        let (_dir, mut manager) = manager_with(&[ArchiveIdCode::Sdmc]);
        assert!(matches!(
            manager.register_self_ncch(&app),
            Err(FsError::ArchiveNotRegistered(ArchiveIdCode::SelfNcch))
        ));
    }

    #[test]
    fn title_content_through_ncch() {
        let (_dir, mut manager) = full_manager();
        let app = TestApp::default();
        manager.register_title_content(MediaType::GameCard, &app).unwrap();

        let path = ncch_archive_path(ProgramId(0x0004_0000_0016_4800), MediaType::GameCard);
        let handle = manager.open_archive(ArchiveIdCode::Ncch, &path).unwrap();

        let romfs = manager
            .open_file_from_archive(handle, &FsPath::binary([0u8; 20]), Mode::READ)
            .unwrap();
        let mut buf = vec![0; app.romfs.len()];
        romfs.read(0, &mut buf).unwrap();
        assert_eq!(buf, app.romfs);
        assert_eq!(
            manager
                .delete_file_from_archive(handle, &"/x".into())
                .unwrap_err()
                .code(),
            ERROR_UNSUPPORTED_OPEN_FLAGS
        );
    }

    #[test]
    fn free_bytes_per_category() {
        let (_dir, mut manager) = full_manager();
        let sdmc = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty).unwrap();
        assert_eq!(
            manager.get_free_bytes_in_archive(sdmc).unwrap(),
            1024 * 1024 * 1024
        );

        let file = manager
            .open_file_from_archive(sdmc, &"/f".into(), Mode::WRITE | Mode::CREATE)
            .unwrap();
        file.set_size(10).unwrap();
        assert_eq!(file.size().unwrap(), 10);
        let _ = file.flush();
        drop(file);

        let storage_len = fs::metadata(manager.config().sdmc_directory.join("f"))
            .unwrap()
            .len();
        assert_eq!(storage_len, 10);
    }
}

//! What the filesystem needs from whoever loaded the running application.

use crate::{
    common::ProgramId,
    error::{ERROR_EXEFS_SECTION_NOT_FOUND, ERROR_ROMFS_NOT_FOUND},
    storage::Storage,
    FsResult,
};

/// Hands over the parts of an application container that the NCCH archives
/// expose. Container parsing happens on the implementor's side, everything
/// arrives here already decrypted and extracted.
pub trait AppLoader {
    fn read_program_id(&self) -> FsResult<ProgramId>;

    fn read_romfs(&self) -> FsResult<Storage>;

    fn read_update_romfs(&self) -> FsResult<Storage> {
        Err(ERROR_ROMFS_NOT_FOUND.into())
    }

    /// The `.code` ExeFS section.
    fn read_code(&self) -> FsResult<Vec<u8>> {
        Err(ERROR_EXEFS_SECTION_NOT_FOUND.into())
    }

    fn read_icon(&self) -> FsResult<Vec<u8>> {
        Err(ERROR_EXEFS_SECTION_NOT_FOUND.into())
    }

    fn read_banner(&self) -> FsResult<Vec<u8>> {
        Err(ERROR_EXEFS_SECTION_NOT_FOUND.into())
    }

    fn read_logo(&self) -> FsResult<Vec<u8>> {
        Err(ERROR_EXEFS_SECTION_NOT_FOUND.into())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::VecStorage;

    /// An application with a RomFS and an icon, nothing else.
    #[derive(Debug, Clone)]
    pub(crate) struct TestApp {
        pub program_id: Option<u64>,
        pub romfs: Vec<u8>,
        pub icon: Vec<u8>,
    }

    impl Default for TestApp {
        fn default() -> Self {
            Self {
                program_id: Some(0x0004_0000_0016_4800),
                romfs: b"romfs contents".to_vec(),
                icon: b"SMDH".to_vec(),
            }
        }
    }

    impl AppLoader for TestApp {
        fn read_program_id(&self) -> FsResult<ProgramId> {
            self.program_id
                .map(ProgramId)
                .ok_or_else(|| crate::error::ERROR_NOT_FOUND.into())
        }

        fn read_romfs(&self) -> FsResult<Storage> {
            Ok(VecStorage::new(self.romfs.clone()))
        }

        fn read_icon(&self) -> FsResult<Vec<u8>> {
            Ok(self.icon.clone())
        }
    }

    #[test]
    fn defaults_report_missing_sections() {
        let app = TestApp::default();
        assert_eq!(
            app.read_update_romfs().unwrap_err().code(),
            ERROR_ROMFS_NOT_FOUND
        );
        assert_eq!(
            app.read_logo().unwrap_err().code(),
            ERROR_EXEFS_SECTION_NOT_FOUND
        );
        assert_eq!(app.read_icon().unwrap(), b"SMDH");
    }
}

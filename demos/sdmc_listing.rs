use ctrfs::prelude::*;

use std::path::PathBuf;

fn list(manager: &ArchiveManager, handle: ArchiveHandle, path: &str, depth: usize) -> FsResult<()> {
    let mut dir = manager.open_directory_from_archive(handle, &path.into())?;

    loop {
        let entries = dir.read(32)?;
        if entries.is_empty() {
            break;
        }

        for entry in entries {
            let child = format!("{}/{}", path.trim_end_matches('/'), entry.name);
            if entry.is_directory {
                println!("{:indent$}{}/", "", entry.name, indent = depth * 2);
                list(manager, handle, &child, depth + 1)?;
            } else {
                println!(
                    "{:indent$}{} [{}]",
                    "",
                    entry.name,
                    humansize::format_size(entry.file_size, humansize::BINARY),
                    indent = depth * 2
                );
            }
        }
    }

    Ok(())
}

fn main() -> FsResult<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(root) => {
            let root = PathBuf::from(root);
            FsConfig::new(root.join("nand"), root.join("sdmc"))
        }
        None => FsConfig::from_env()?,
    };
    let start = args.next().unwrap_or_else(|| "/".into());

    let mut manager = ArchiveManager::with_archive_types(config, &[ArchiveIdCode::Sdmc])?;
    let handle = manager.open_archive(ArchiveIdCode::Sdmc, &FsPath::Empty)?;

    println!(
        "SDMC {} ({} free)",
        manager.config().sdmc_directory.display(),
        humansize::format_size(
            manager.get_free_bytes_in_archive(handle)?,
            humansize::BINARY
        )
    );
    list(&manager, handle, &start, 1)?;

    manager.close_archive(handle)
}

//! Tar streams for moving single files in and out of containers

use std::io::Read;
use std::path::Path;

use tar::{Archive, Builder, EntryType, Header};

use crate::error::{Error, Result};

/// Build an archive holding one file at `path`, plus entries for each of its
/// parent directories, suitable for extracting at the container root.
pub fn single_file(path: &str, contents: &[u8], mode: u32) -> Result<Vec<u8>> {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        return Err(Error::archive(format!("not a file path: '{path}'")));
    }

    let mut builder = Builder::new(Vec::new());

    let mut ancestors: Vec<&Path> = Path::new(relative)
        .ancestors()
        .skip(1)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    ancestors.reverse();
    for dir in ancestors {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        header.set_mtime(0);
        builder
            .append_data(&mut header, dir, std::io::empty())
            .map_err(Error::archive)?;
    }

    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(mode);
    header.set_size(contents.len() as u64);
    header.set_mtime(0);
    builder
        .append_data(&mut header, relative, contents)
        .map_err(Error::archive)?;

    builder.into_inner().map_err(Error::archive)
}

/// The contents of the first regular file in an archive, if any.
///
/// Reading a single path out of a container yields an archive with exactly
/// that file in it.
pub fn read_single_file(archive: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut archive = Archive::new(archive);
    for entry in archive.entries().map_err(Error::archive)? {
        let mut entry = entry.map_err(Error::archive)?;
        if entry.header().entry_type().is_file() {
            let mut contents = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut contents).map_err(Error::archive)?;
            return Ok(Some(contents));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(archive: &[u8]) -> Vec<(String, EntryType, u32)> {
        Archive::new(archive)
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (
                    e.path()
                        .unwrap()
                        .to_string_lossy()
                        .trim_end_matches('/')
                        .to_string(),
                    e.header().entry_type(),
                    e.header().mode().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_single_file_includes_parent_directories() {
        let archive = single_file("/opt/unholy/stack-0.sh", b"echo hi\n", 0o755).unwrap();
        let listed = entries(&archive);

        assert_eq!(
            listed,
            vec![
                ("opt".to_string(), EntryType::Directory, 0o755),
                ("opt/unholy".to_string(), EntryType::Directory, 0o755),
                ("opt/unholy/stack-0.sh".to_string(), EntryType::Regular, 0o755),
            ]
        );
    }

    #[test]
    fn test_single_file_at_root() {
        let archive = single_file("Unholyfile", b"x", 0o644).unwrap();
        assert_eq!(
            entries(&archive),
            vec![("Unholyfile".to_string(), EntryType::Regular, 0o644)]
        );
    }

    #[test]
    fn test_read_single_file_skips_directories() {
        let archive = single_file("/a/b/file", b"contents", 0o644).unwrap();
        assert_eq!(read_single_file(&archive).unwrap().as_deref(), Some(&b"contents"[..]));
    }

    #[test]
    fn test_read_single_file_empty_archive() {
        let archive = Builder::new(Vec::new()).into_inner().unwrap();
        assert_eq!(read_single_file(&archive).unwrap(), None);
    }

    #[test]
    fn test_single_file_rejects_root() {
        assert!(single_file("/", b"", 0o644).is_err());
    }
}

//! In-place editing of Unholyfiles
//!
//! Edits go through [`edit`], which hands the parsed TOML document to a
//! closure and writes the file back only when the closure succeeds. The
//! divider lines and the script tail are written back exactly as they were
//! read; only the TOML block is re-rendered, and `toml_edit` keeps its
//! comments and layout intact.

use std::borrow::Cow;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use fs2::FileExt;
use tempfile::NamedTempFile;
use toml_edit::{DocumentMut, Item, Table, TableLike};

use crate::error::{Error, Result};
use crate::headmatter::{self, Headmatter};

/// A parsed TOML headmatter block.
pub type ConfigDocument = DocumentMut;

/// Divider written when the original file had none.
const DEFAULT_DIVIDER: &str = "---\n";

/// Read an Unholyfile, returning its document and script tail.
pub fn read(path: &Path) -> Result<(ConfigDocument, String)> {
    let text = read_existing(path)?.ok_or_else(|| Error::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let (document, tail) = headmatter::parse(&text, &path.display().to_string())?;
    Ok((document, tail.to_string()))
}

/// Edit an Unholyfile's TOML block in place.
///
/// A missing file is treated as empty when `create` is true and is an
/// [`Error::FileNotFound`] otherwise. The file is rewritten only if `f`
/// returns `Ok`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// unholy_config::document::edit(Path::new("demo.Unholyfile"), true, |doc| {
///     doc["repository"] = toml_edit::value("https://example.com/demo.git");
///     Ok::<_, unholy_config::Error>(())
/// })?;
/// # Ok::<(), unholy_config::Error>(())
/// ```
pub fn edit<R, E>(
    path: &Path,
    create: bool,
    f: impl FnOnce(&mut ConfigDocument) -> std::result::Result<R, E>,
) -> std::result::Result<R, E>
where
    E: From<Error>,
{
    let text = match read_existing(path)? {
        Some(text) => text,
        None if create => {
            tracing::debug!(path = %path.display(), "Creating new Unholyfile");
            String::new()
        }
        None => {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
    };

    let parts = headmatter::split(&text);
    let mut document = parts
        .head
        .parse::<ConfigDocument>()
        .map_err(|e| Error::parse(path.display().to_string(), e.to_string()))?;

    let result = f(&mut document)?;

    let rendered = render(&parts, &document);
    write_atomic(path, rendered.as_bytes())?;
    tracing::debug!(path = %path.display(), "Wrote Unholyfile");

    Ok(result)
}

/// Set a dotted key such as `dev.volume`, creating intermediate tables.
///
/// Fails with [`Error::WrongType`] when an intermediate key holds a scalar.
pub fn set_path(document: &mut ConfigDocument, path: &str, item: Item) -> Result<()> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (parents.split('.').collect(), leaf),
        None => (Vec::new(), path),
    };

    let mut table: &mut dyn TableLike = document.as_table_mut();
    let mut walked = String::new();
    for key in parents {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(key);

        let entry = table.entry(key).or_insert_with(|| {
            let mut implicit = Table::new();
            implicit.set_implicit(true);
            Item::Table(implicit)
        });
        let found = entry.type_name();
        table = entry.as_table_like_mut().ok_or_else(|| Error::WrongType {
            key: walked.clone(),
            expected: "table",
            found,
        })?;
    }

    table.insert(leaf, item);
    Ok(())
}

/// Reassemble a file from its original parts and an edited document.
pub fn render(parts: &Headmatter<'_>, document: &ConfigDocument) -> String {
    let body = document.to_string();
    let mut out = String::with_capacity(
        parts.leader.len() + body.len() + parts.divider.len() + parts.tail.len() + 8,
    );

    out.push_str(&fence(parts.leader));
    out.push_str(&body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence(parts.divider));
    out.push_str(parts.tail);
    out
}

/// A divider line that is guaranteed to end the line it sits on.
fn fence(line: &str) -> Cow<'_, str> {
    if line.is_empty() {
        Cow::Borrowed(DEFAULT_DIVIDER)
    } else if line.ends_with('\n') {
        Cow::Borrowed(line)
    } else {
        Cow::Owned(format!("{line}\n"))
    }
}

fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Write content atomically: temp file in the same directory, then rename.
///
/// The temp file is removed on every error path.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            parent
        }
        None => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    let temp_path = temp_file.path().to_path_buf();

    temp_file
        .as_file()
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    FileExt::unlock(temp_file.as_file()).map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    temp_file
        .persist(path)
        .map_err(|e| Error::io(path, e.error))?;

    Ok(())
}

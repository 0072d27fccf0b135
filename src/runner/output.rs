//! Writers for driver output: emitted data sets, plans, and listings.
//!
//! Files are written through capability-based directory handles; `-` selects
//! stdout, where a closed pipe is not treated as an error.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io::{self, Write};
use tracing::info;

/// Return `true` when `path` is the CLI sentinel meaning "write to stdout".
#[must_use]
pub fn is_stdout_path(path: &Utf8Path) -> bool {
    path.as_str() == "-"
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        other => other,
    }
}

/// Write `content` to stdout.
///
/// # Errors
///
/// Fails when stdout rejects the write for a reason other than a closed pipe.
pub fn write_stdout(content: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    ignore_broken_pipe(stdout.write_all(content)).context("write to stdout")?;
    ignore_broken_pipe(stdout.flush()).context("flush stdout")?;
    Ok(())
}

fn dir_and_relative(path: &Utf8Path) -> Result<(Dir, Utf8PathBuf)> {
    if path.is_relative() {
        let dir = Dir::open_ambient_dir(".", ambient_authority())
            .context("open current directory")?;
        return Ok((dir, path.to_owned()));
    }
    let (base, dir) = path
        .ancestors()
        .skip(1)
        .find_map(|candidate| {
            Dir::open_ambient_dir(candidate, ambient_authority())
                .ok()
                .map(|dir| (candidate.to_owned(), dir))
        })
        .ok_or_else(|| anyhow!("no existing ancestor directory for {path}"))?;
    let relative = path
        .strip_prefix(&base)
        .with_context(|| format!("derive {path} relative to {base}"))?
        .to_owned();
    Ok((dir, relative))
}

/// Write `content` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Fails when a directory cannot be opened or created, or the file cannot be
/// written and synced.
pub fn write_file(path: &Utf8Path, content: &[u8]) -> Result<()> {
    let (dir, relative) = dir_and_relative(path)?;
    if let Some(parent) = relative.parent().filter(|p| !p.as_str().is_empty()) {
        dir.create_dir_all(parent)
            .with_context(|| format!("create directory {parent}"))?;
    }
    let mut file = dir
        .create(&relative)
        .with_context(|| format!("create {path}"))?;
    file.write_all(content)
        .with_context(|| format!("write {path}"))?;
    file.sync_all().with_context(|| format!("sync {path}"))?;
    info!(path = %path, bytes = content.len(), "wrote output file");
    Ok(())
}

/// Write `content` to `path`, or to stdout when `path` is `-`.
///
/// # Errors
///
/// See [`write_stdout`] and [`write_file`].
pub fn write_output(path: &Utf8Path, content: &[u8]) -> Result<()> {
    if is_stdout_path(path) {
        write_stdout(content)
    } else {
        write_file(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::ensure;
    use rstest::rstest;

    #[rstest]
    #[case("-", true)]
    #[case("--", false)]
    #[case("out.json", false)]
    #[case("./-", false)]
    fn is_stdout_path_detects_dash(#[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(is_stdout_path(Utf8Path::new(candidate)), expected);
    }

    #[test]
    fn write_file_creates_parent_directories() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| anyhow!("non-UTF-8 temp dir {}", path.display()))?;
        let target = root.join("nested/deeper/data.json");
        write_file(&target, b"{}\n")?;
        let written = std::fs::read_to_string(&target).context("read back")?;
        ensure!(written == "{}\n", "unexpected contents {written:?}");
        Ok(())
    }

    #[test]
    fn broken_pipe_is_ignored() {
        let broken = Err(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(ignore_broken_pipe(broken).is_ok());
        let denied = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(ignore_broken_pipe(denied).is_err());
    }
}

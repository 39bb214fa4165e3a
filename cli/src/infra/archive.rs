//! Archive infrastructure: gzip compression and tar sealing.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::application::ports::ArchiveWriter;
use crate::infra::blocking;
use crate::infra::fs::is_hidden;

/// `tar` + `flate2` implementation of `ArchiveWriter`.
pub struct TarArchiver;

impl ArchiveWriter for TarArchiver {
    async fn compress_in_place(&self, source: &Path, dest: &Path) -> Result<()> {
        let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
        blocking("compress_in_place", move || compress_file(&source, &dest)).await
    }

    async fn seal(&self, dir: &Path, top: &str, dest: &Path) -> Result<()> {
        let (dir, top, dest) = (dir.to_path_buf(), top.to_string(), dest.to_path_buf());
        blocking("seal", move || seal_dir(&dir, &top, &dest)).await
    }
}

fn compress_file(source: &Path, dest: &Path) -> Result<()> {
    let partial = partial_path(dest);
    {
        let mut input = BufReader::new(
            File::open(source).with_context(|| format!("opening {}", source.display()))?,
        );
        let output = File::create(&partial)
            .with_context(|| format!("creating {}", partial.display()))?;
        let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
        std::io::copy(&mut input, &mut encoder)
            .with_context(|| format!("compressing {}", source.display()))?;
        encoder
            .finish()
            .with_context(|| format!("finishing {}", partial.display()))?
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing {}: {}", partial.display(), e.error()))?;
    }
    std::fs::rename(&partial, dest)
        .with_context(|| format!("renaming {} to {}", partial.display(), dest.display()))?;
    std::fs::remove_file(source).with_context(|| format!("removing {}", source.display()))
}

fn seal_dir(dir: &Path, top: &str, dest: &Path) -> Result<()> {
    let partial = partial_path(dest);
    let file =
        File::create(&partial).with_context(|| format!("creating {}", partial.display()))?;
    let mut builder = tar::Builder::new(BufWriter::new(file));
    builder.follow_symlinks(false);

    let walker = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("{} outside {}", entry.path().display(), dir.display()))?;
        let name = Path::new(top).join(relative);
        if entry.file_type().is_dir() {
            builder
                .append_dir(&name, entry.path())
                .with_context(|| format!("archiving {}", entry.path().display()))?;
        } else {
            builder
                .append_path_with_name(entry.path(), &name)
                .with_context(|| format!("archiving {}", entry.path().display()))?;
        }
    }
    builder
        .into_inner()
        .context("finishing tar")?
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing {}: {}", partial.display(), e.error()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("renaming {} to {}", partial.display(), dest.display()))
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dest.with_file_name(name)
}

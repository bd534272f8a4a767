//! Zip packaging of a single artifact.

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// A freshly written zip archive ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedAsset {
    /// Archive path, relative to the working directory.
    pub path: PathBuf,
    /// Lowercase hex SHA256 of the archive.
    pub sha256: String,
}

impl PackagedAsset {
    /// File name used as the release asset name.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Archive path for `path`: the extension is dropped and `-<label>.zip` appended.
///
/// `dist/LBRY-1.2.3.exe` + `Windows` → `dist/LBRY-1.2.3-Windows.zip`
pub fn packaged_path(path: &Path, label: &str) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Cannot derive archive name from {}", path.display()))?;
    let name = format!("{stem}-{label}.zip");
    Ok(match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    })
}

/// Zip entry name for `path`: normal components joined with `/`, so roots,
/// drive prefixes and `.` segments never end up in the archive.
pub fn entry_name(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| anyhow::anyhow!("Non UTF-8 path: {}", path.display()))?,
            ),
            Component::ParentDir => bail!("Refusing to archive a path with '..': {}", path.display()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    if parts.is_empty() {
        bail!("Empty archive entry name for {}", path.display());
    }
    Ok(parts.join("/"))
}

/// Package `path` (relative to `workdir`) into `<base>-<label>.zip`.
///
/// The archive is always rewritten, even if one with that name already exists,
/// and holds exactly one entry named after `path` as given.
pub fn package(workdir: &Path, path: &Path, label: &str) -> Result<PackagedAsset> {
    let source = workdir.join(path);
    let zip_rel = packaged_path(path, label)?;
    let zip_abs = workdir.join(&zip_rel);
    let name = entry_name(path)?;

    let mut input = std::fs::File::open(&source)
        .with_context(|| format!("Failed to open artifact: {}", source.display()))?;
    let output = std::fs::File::create(&zip_abs)
        .with_context(|| format!("Failed to create archive: {}", zip_abs.display()))?;

    let mut options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = input
            .metadata()
            .with_context(|| format!("Failed to stat artifact: {}", source.display()))?
            .permissions()
            .mode();
        options = options.unix_permissions(mode);
    }

    let mut writer = zip::ZipWriter::new(output);
    writer
        .start_file(name, options)
        .context("Failed to start zip entry")?;
    io::copy(&mut input, &mut writer)
        .with_context(|| format!("Failed to write {} into archive", source.display()))?;
    writer.finish().context("Failed to finalize zip archive")?;

    let sha256 = sha256_file(&zip_abs)?;
    Ok(PackagedAsset {
        path: zip_rel,
        sha256,
    })
}

/// Computes the SHA256 digest of a file and returns it as a lowercase hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file for checksum: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for checksum: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

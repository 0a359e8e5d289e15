//! On-disk pre-compression of cached files.

use flate2::write::GzEncoder;
use flate2::Compression;
use lattice_http::ServeError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Compresses `source` into `dest` as a gzip stream.
pub fn gzip_compress_file(source: &Path, dest: &Path, level: Compression) -> io::Result<()> {
    let mut input = std::fs::File::open(source)?;
    let output = std::fs::File::create(dest)?;

    let mut encoder = GzEncoder::new(output, level);
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

/// Compresses `source` into `dest` as a brotli stream.
pub fn brotli_compress_file(source: &Path, dest: &Path, quality: u32) -> io::Result<()> {
    let mut input = std::fs::File::open(source)?;
    let output = std::fs::File::create(dest)?;

    let mut encoder = brotli::CompressorWriter::new(
        output,
        32 * 1024, // 32 KiB buffer
        quality,
        22, // BROTLI_PARAM_LGWIN
    );
    io::copy(&mut input, &mut encoder)?;
    encoder.flush()?;
    Ok(())
}

/// Builds the `<path>.gzip` sibling of `file_path` at best compression and
/// returns its path and size.
///
/// The variant is always rebuilt, replacing a stale sibling from an earlier
/// run. A failed build is retried once after a short pause; failing twice is
/// a `Compression` error.
pub(crate) async fn build_gzip_variant(file_path: &Path) -> Result<(PathBuf, u64), ServeError> {
    let gzip_path = gzip_sibling_path(file_path);

    if let Err(first) = run_gzip(file_path, &gzip_path).await {
        warn!(path = %file_path.display(), cause = %first, "gzip build failed, retrying");
        tokio::time::sleep(Duration::from_millis(250)).await;
        run_gzip(file_path, &gzip_path).await.map_err(ServeError::compression)?;
    }

    let stat = tokio::fs::metadata(&gzip_path).await?;
    Ok((gzip_path, stat.len()))
}

async fn run_gzip(source: &Path, dest: &Path) -> io::Result<()> {
    let source = source.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || gzip_compress_file(&source, &dest, Compression::best()))
        .await
        .map_err(|join_error| io::Error::new(io::ErrorKind::Other, join_error))?
}

fn gzip_sibling_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".gzip");
    PathBuf::from(os)
}

//! Blocking artifact download to the local filesystem.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    error::{DownloadError, Result},
    http::Http,
};

const CHUNK_SIZE: usize = 8192;

/// Downloads `url` to `target`, creating parent directories as needed.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// * [`DownloadError::HttpError`] for a non-success response status.
/// * [`DownloadError::Io`] for filesystem failures.
pub fn download_to(url: &str, target: &Path) -> Result<u64> {
    let resp = Http::get(url)?;
    let status = resp.status();

    if !status.is_success() {
        return Err(DownloadError::HttpError {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut reader = resp.into_body().into_reader();
    let mut file = File::create(target)?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        written += n as u64;
    }

    file.flush()?;
    debug!("Downloaded {} bytes from {} to {:?}", written, url, target);

    Ok(written)
}

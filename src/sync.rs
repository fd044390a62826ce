//! The sync pipeline: authenticate, make sure the remote folder exists,
//! then upload every regular file from the source directory.
//!
//! A fresh token is fetched before the folder check and before each upload.
//! Tokens are passed along as values; nothing is cached between steps.

use crate::api::{parse_token, ImageHost, RawResponse, SessionToken};
use crate::config::{Config, Credentials};
use crate::error::{Result, SyncError};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Did the token endpoint accept the credentials?
pub fn token_accepted(status: StatusCode) -> bool {
    status.is_success()
}

/// Does a directory listing status mean the folder is already there?
pub fn folder_exists(status: StatusCode) -> bool {
    status.is_success()
}

/// Should an upload status stop the run? Rejected uploads are only logged.
pub fn upload_is_fatal(_status: StatusCode) -> bool {
    false
}

/// What `ensure_folder` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Existing,
    /// A create request was sent; its status is informational only.
    CreateRequested(StatusCode),
}

/// One upload attempt that got an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub file_name: String,
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub folder: FolderState,
    pub uploads: Vec<UploadRecord>,
}

impl SyncReport {
    pub fn rejected(&self) -> usize {
        self.uploads.iter().filter(|u| !u.status.is_success()).count()
    }

    pub fn accepted(&self) -> usize {
        self.uploads.len() - self.rejected()
    }
}

/// Exchange the credentials for a session token.
pub fn obtain_token<H>(host: &H, credentials: &Credentials) -> Result<SessionToken>
where
    H: ImageHost + ?Sized,
{
    let RawResponse { status, body } = host.request_token(credentials)?;
    if !token_accepted(status) {
        return Err(SyncError::Credentials {
            status,
            detail: body.trim().to_string(),
        });
    }
    parse_token(&body).map_err(|detail| SyncError::Credentials { status, detail })
}

/// Check that `dir_path` exists remotely and ask for it to be created if not.
/// The create outcome is not checked.
pub fn ensure_folder<H>(host: &H, credentials: &Credentials, dir_path: &str) -> Result<FolderState>
where
    H: ImageHost + ?Sized,
{
    let token = obtain_token(host, credentials)?;
    let status = host.read_dir(&token, dir_path)?;
    if folder_exists(status) {
        debug!(dir = dir_path, "remote folder exists");
        return Ok(FolderState::Existing);
    }

    info!(dir = dir_path, listing = status.as_u16(), "remote folder missing, creating");
    let created = host.make_dir(&token, dir_path)?;
    if !created.is_success() {
        warn!(dir = dir_path, status = created.as_u16(), "create folder request not successful");
    }
    Ok(FolderState::CreateRequested(created))
}

/// Regular files directly inside `source_dir`, sorted by name.
/// Subdirectories are skipped, not descended into.
pub fn list_source_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(source_dir).map_err(|e| SyncError::io(source_dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SyncError::io(source_dir, e))?.path();
        if !path.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
        } else if path.file_name().and_then(OsStr::to_str).is_none() {
            // a lossy name could collide with another file on the remote side
            warn!(path = %path.display(), "skipping file with non-UTF-8 name");
        } else {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn upload_spinner(file_name: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Uploading {}...", file_name));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Upload every regular file in `source_dir` into `remote_dir`.
///
/// For each file the name is written to `out`, a new token is fetched, the
/// file is streamed up and the response is written to `out`. A transport
/// failure ends the run at once; a non-success status does not.
pub fn upload_all<H, W>(
    host: &H,
    credentials: &Credentials,
    source_dir: &Path,
    remote_dir: &str,
    out: &mut W,
) -> Result<Vec<UploadRecord>>
where
    H: ImageHost + ?Sized,
    W: Write + ?Sized,
{
    let files = list_source_files(source_dir)?;
    info!(count = files.len(), dir = %source_dir.display(), "uploading files");

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        let file_name = match path.file_name().and_then(OsStr::to_str) {
            Some(name) => name.to_string(),
            None => continue,
        };
        writeln!(out, "{}", file_name).map_err(|e| SyncError::io("<stdout>", e))?;

        let token = obtain_token(host, credentials)?;
        let file = File::open(&path).map_err(|e| SyncError::io(&path, e))?;
        let remote_path = format!("{}{}", remote_dir, file_name);

        let spinner = upload_spinner(&file_name);
        let result = host.upload(&token, &remote_path, file);
        spinner.finish_and_clear();

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(file = %file_name, error = %err, "upload aborted");
                return Err(err);
            }
        };
        writeln!(out, "{}", response).map_err(|e| SyncError::io("<stdout>", e))?;

        if !response.status.is_success() {
            warn!(file = %file_name, status = response.status.as_u16(), "upload not accepted");
            if upload_is_fatal(response.status) {
                return Err(SyncError::UploadRejected {
                    file: file_name,
                    status: response.status,
                });
            }
        }
        records.push(UploadRecord {
            file_name,
            status: response.status,
        });
    }
    Ok(records)
}

/// Full run: ensure the remote folder, then upload everything.
pub fn run<H, W>(host: &H, config: &Config, out: &mut W) -> Result<SyncReport>
where
    H: ImageHost + ?Sized,
    W: Write + ?Sized,
{
    let folder = ensure_folder(host, &config.credentials, &config.remote_dir)?;
    let uploads = upload_all(
        host,
        &config.credentials,
        &config.source_dir,
        &config.remote_dir,
        out,
    )?;
    Ok(SyncReport { folder, uploads })
}

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

/// Local file name for a download: everything after the last `/`, trimmed.
pub fn local_file_name(url: &str) -> String {
    url.rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(url)
        .trim()
        .to_string()
}

/// Retrieves a remote file into local storage
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path);
}

/// Shells out to `wget <url> -O <dest>` and waits for it to exit.
///
/// The exit status is only logged. A failed download shows up later, when the
/// batch reader opens a missing or truncated file.
pub struct WgetFetcher {
    program: String,
}

impl WgetFetcher {
    pub fn new() -> Self {
        Self {
            program: "wget".to_string(),
        }
    }

    // Use a different wget-compatible binary
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for WgetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for WgetFetcher {
    fn fetch(&self, url: &str, dest: &Path) {
        debug!("Running {} {} -O {}", self.program, url, dest.display());

        match Command::new(&self.program)
            .arg(url)
            .arg("-O")
            .arg(dest)
            .status()
        {
            Ok(status) if status.success() => debug!("Download finished: {}", dest.display()),
            Ok(status) => warn!("{} exited with {} for {}", self.program, status, url),
            Err(e) => warn!("Could not run {}: {}", self.program, e),
        }
    }
}

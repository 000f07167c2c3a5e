use std::path::{Path, PathBuf};

/// Runtime configuration for the client.
#[derive(Debug, Clone)]
pub struct Config {
    api_url: String,
    session_file: PathBuf,
}

impl Config {
    pub fn new(api_url: String, session_file: PathBuf) -> Self {
        Self {
            api_url,
            session_file,
        }
    }

    /// Base URL of the backend API, e.g. `http://localhost:5000/api`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Where the signed-in session is persisted between invocations.
    pub fn session_file(&self) -> &Path {
        &self.session_file
    }
}

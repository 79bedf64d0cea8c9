/*
[INPUT]:  Refresh token + identity of the signed-in user, storage directory
[OUTPUT]: Persisted sign-in restored on the next start
[POS]:    Auth layer - local persistence of the auth session
[UPDATE]: When session file format or location changes
*/

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Identity;

const SESSION_FILE_NAME: &str = "session.json";

/// Persisted part of a sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub refresh_token: String,
    pub identity: Identity,
}

/// Reads and writes the session file
#[derive(Debug, Clone)]
pub struct SessionPersistence {
    dir: PathBuf,
}

impl SessionPersistence {
    /// Create a persistence handle rooted at `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `<data dir>/firetodo`, if the platform has a data directory
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("firetodo"))
    }

    /// Full path of the session file
    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE_NAME)
    }

    /// Load the stored session; unreadable files count as absent
    pub fn load(&self) -> Option<StoredSession> {
        let path = self.path();
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring corrupt session file");
                None
            }
        }
    }

    /// Write the session, readable by the owner only
    pub fn save(&self, session: &StoredSession) -> io::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let path = self.path();
        let encoded = serde_json::to_string_pretty(session)?;
        fs::write(&path, encoded)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Remove the session file; a missing file is fine
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

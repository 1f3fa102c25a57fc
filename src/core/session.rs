//! Admin gate: fixed credentials plus a session flag that survives restarts.
//!
//! The flag is a small marker file (`$XDG_STATE_HOME/adzone/session`, default
//! `~/.local/state/adzone/session`).  Its presence means "logged in".

use std::path::PathBuf;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Try admin / admin123";

#[derive(Debug, Clone)]
pub struct AdminGate {
    session_file: PathBuf,
}

impl AdminGate {
    pub fn new(session_file: impl Into<PathBuf>) -> Self {
        Self {
            session_file: session_file.into(),
        }
    }

    /// Gate using the default session location.
    pub fn from_env() -> Self {
        Self::new(session_path())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_file.exists()
    }

    /// Check the credentials and persist the session on success.  A session
    /// that cannot be written only costs the next start a login.
    pub fn login(&self, username: &str, password: &str) -> Result<(), &'static str> {
        if username.trim() != ADMIN_USERNAME || password != ADMIN_PASSWORD {
            tracing::info!("admin login rejected");
            return Err(INVALID_CREDENTIALS);
        }
        if let Err(e) = self.persist() {
            tracing::warn!(error = %e, "could not persist admin session");
        }
        tracing::info!("admin logged in");
        Ok(())
    }

    pub fn logout(&self) {
        match std::fs::remove_file(&self.session_file) {
            Ok(()) => tracing::info!("admin logged out"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, "could not clear admin session"),
        }
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.session_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.session_file, "true\n")?;
        Ok(())
    }
}

/// Return the session flag path (`$XDG_STATE_HOME/adzone/session`).
fn session_path() -> PathBuf {
    let state_dir = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".local").join("state")
        });
    state_dir.join("adzone").join("session")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_credentials_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gate = AdminGate::new(dir.path().join("session"));
        assert_eq!(gate.login("admin", "nope"), Err(INVALID_CREDENTIALS));
        assert_eq!(gate.login("root", "admin123"), Err(INVALID_CREDENTIALS));
        assert!(!gate.is_logged_in());
    }

    #[test]
    fn session_persists_across_gates_until_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session");
        AdminGate::new(&path).login("admin", "admin123").unwrap();

        let fresh = AdminGate::new(&path);
        assert!(fresh.is_logged_in());
        fresh.logout();
        fresh.logout();
        assert!(!AdminGate::new(&path).is_logged_in());
    }
}

//! Data directory layout.

use std::path::PathBuf;

/// Resolve the data directory.
///
/// `AGENTLINE_DATA_DIR` wins; otherwise `~/.agentline`, or `./.agentline`
/// when there is no home directory.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AGENTLINE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".agentline");
    }

    PathBuf::from(".agentline")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: no other test in this crate reads or writes AGENTLINE_DATA_DIR
        // concurrently, and the var is removed again immediately.
        unsafe {
            std::env::set_var("AGENTLINE_DATA_DIR", "/tmp/test-agentline");
        }
        let dir = resolve_data_dir();
        unsafe {
            std::env::remove_var("AGENTLINE_DATA_DIR");
        }
        assert_eq!(dir, PathBuf::from("/tmp/test-agentline"));
    }
}

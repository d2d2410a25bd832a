//! Worker identity.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Process-wide identity that fixes a worker's filesystem namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub id: String,
    pub name: String,
}

impl WorkerIdentity {
    /// Create an identity; an empty `name` becomes `video-worker-{id}`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        let name = if name.is_empty() {
            format!("video-worker-{}", id)
        } else {
            name
        };
        Self { id, name }
    }

    fn namespace(&self) -> String {
        format!("worker-{}", self.id)
    }

    /// `{base}/temp/worker-{id}`
    pub fn temp_dir(&self, base: impl AsRef<Path>) -> PathBuf {
        base.as_ref().join("temp").join(self.namespace())
    }

    /// `{base}/outputs/worker-{id}`
    pub fn output_dir(&self, base: impl AsRef<Path>) -> PathBuf {
        base.as_ref().join("outputs").join(self.namespace())
    }
}

impl Default for WorkerIdentity {
    fn default() -> Self {
        Self::new("1", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        let identity = WorkerIdentity::new("7", "");
        assert_eq!(identity.name, "video-worker-7");
        assert_eq!(WorkerIdentity::new("7", "edge").name, "edge");
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let a = WorkerIdentity::new("1", "");
        let b = WorkerIdentity::new("2", "");
        let base = Path::new("/srv/vframe");

        assert_eq!(a.temp_dir(base), PathBuf::from("/srv/vframe/temp/worker-1"));
        assert_eq!(a.output_dir(base), PathBuf::from("/srv/vframe/outputs/worker-1"));
        assert!(!a.temp_dir(base).starts_with(b.temp_dir(base)));
        assert!(!b.output_dir(base).starts_with(a.output_dir(base)));
    }
}

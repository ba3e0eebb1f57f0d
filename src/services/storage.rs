use std::path::PathBuf;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::config::Settings;

/// Local-disk store for submitted files. Every stored file gets a fresh
/// uuid prefix so colliding client names never overwrite each other.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    root: PathBuf,
}

#[derive(Debug)]
pub(crate) struct StoredFile {
    pub(crate) file_name: String,
    pub(crate) file_path: String,
    pub(crate) file_size: i64,
    pub(crate) file_hash: String,
}

impl StorageService {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let root = PathBuf::from(&settings.storage().upload_dir);
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub(crate) async fn store(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredFile> {
        let file_name = sanitized_filename(original_name);
        let stored_name = format!("{}_{file_name}", Uuid::new_v4());
        let path = self.root.join(&stored_name);

        tokio::fs::write(&path, bytes).await?;

        Ok(StoredFile {
            file_name,
            file_path: path.to_string_lossy().into_owned(),
            file_size: bytes.len() as i64,
            file_hash: hex::encode(Sha256::digest(bytes)),
        })
    }
}

pub(crate) fn sanitized_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_filename_strips_path_separators() {
        assert_eq!(sanitized_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitized_filename("essay final.pdf"), "essayfinal.pdf");
        assert_eq!(sanitized_filename("report-v2_final.txt"), "report-v2_final.txt");
    }

    #[test]
    fn sanitized_filename_falls_back_on_empty() {
        assert_eq!(sanitized_filename("???"), "upload");
        assert_eq!(sanitized_filename(""), "upload");
    }
}

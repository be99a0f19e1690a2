use std::path::{Path, PathBuf};

/// Default root for local state when `REELNOTE_DATA_DIR` is not set.
pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("reelnote")
}

/// Directory backing the object store (one sub-directory per folder).
pub fn get_objects_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("objects")
}

/// Directory backing the document store.
pub fn get_documents_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("documents")
}

use std::path::Path;

use crate::error::{ReelnoteError, Result};

/// Content types the processing backend accepts for upload.
pub const ACCEPTED_VIDEO_TYPES: [&str; 4] = ["video/mp4", "video/avi", "video/mpeg", "video/webm"];

pub const VIDEO_EXTENSION: &str = ".mp4";
pub const TEXT_EXTENSION: &str = ".txt";

/// Guess a content type from a file name's extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "avi" => "video/avi",
        "mpeg" | "mpg" => "video/mpeg",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "txt" => "text/plain; charset=utf-8",
        "srt" => "application/x-subrip",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Content type of an upload candidate, or an error if the backend would not
/// accept it.
pub fn upload_content_type(path: &Path) -> Result<&'static str> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = content_type_for(&name);

    if ACCEPTED_VIDEO_TYPES.contains(&content_type) {
        Ok(content_type)
    } else {
        Err(ReelnoteError::UnsupportedMediaType {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn accepts_known_video_types() {
        for name in ["a.mp4", "b.AVI", "c.mpeg", "d.webm", "e.mpg"] {
            assert!(upload_content_type(&PathBuf::from(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_other_files() {
        for name in ["notes.txt", "clip.mov", "noext"] {
            assert!(matches!(
                upload_content_type(&PathBuf::from(name)),
                Err(ReelnoteError::UnsupportedMediaType { .. })
            ));
        }
    }

    #[test]
    fn text_artifacts_are_utf8() {
        assert_eq!(content_type_for("transcript.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("weird.bin"), "application/octet-stream");
    }
}

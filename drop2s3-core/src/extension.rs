//! Maps filenames to media kinds and the sub-path each kind lives under.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the child directory (and key segment) that video files are routed to.
pub const VIDEO_SUBDIR: &str = "video";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Configured sets of recognised extensions. Comparison ignores case and a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionClassifier {
    image: Vec<String>,
    video: Vec<String>,
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        Self::new(["jpg", "png", "heic"], ["mov", "3gp", "mp4"])
    }
}

impl ExtensionClassifier {
    pub fn new<I, V>(image: I, video: V) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        Self {
            image: image.into_iter().map(normalise).collect(),
            video: video.into_iter().map(normalise).collect(),
        }
    }

    /// `None` means the file is out of scope for every scan.
    pub fn kind_of(&self, filename: &str) -> Option<MediaKind> {
        let ext = normalise(Path::new(filename).extension()?.to_str()?);
        if self.video.contains(&ext) {
            Some(MediaKind::Video)
        } else if self.image.contains(&ext) {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    pub fn is_supported(&self, filename: &str) -> bool {
        self.kind_of(filename).is_some()
    }

    /// Local location of `filename` below `base`: videos go to `base/video/`.
    /// Unsupported names resolve like images.
    pub fn local_path(&self, base: &Path, filename: &str) -> PathBuf {
        match self.kind_of(filename) {
            Some(MediaKind::Video) => base.join(VIDEO_SUBDIR).join(filename),
            _ => base.join(filename),
        }
    }

    /// Object key suffix of `filename` relative to the partition prefix.
    pub fn key_suffix(&self, filename: &str) -> String {
        match self.kind_of(filename) {
            Some(MediaKind::Video) => format!("{VIDEO_SUBDIR}/{filename}"),
            _ => filename.to_string(),
        }
    }
}

fn normalise(ext: impl AsRef<str>) -> String {
    ext.as_ref().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions_ignoring_case() {
        let c = ExtensionClassifier::default();
        assert_eq!(c.kind_of("2024-01-15-IMG1.jpg"), Some(MediaKind::Image));
        assert_eq!(c.kind_of("DSCN0001.JPG"), Some(MediaKind::Image));
        assert_eq!(c.kind_of("clip.MOV"), Some(MediaKind::Video));
        assert_eq!(c.kind_of("notes.txt"), None);
        assert_eq!(c.kind_of("no_extension"), None);
    }

    #[test]
    fn videos_route_to_video_subdir() {
        let c = ExtensionClassifier::default();
        let base = Path::new("/staging");
        assert_eq!(c.local_path(base, "a.jpg"), PathBuf::from("/staging/a.jpg"));
        assert_eq!(
            c.local_path(base, "clip.mp4"),
            PathBuf::from("/staging/video/clip.mp4")
        );
        assert_eq!(c.key_suffix("clip.3gp"), "video/clip.3gp");
        assert_eq!(c.key_suffix("a.heic"), "a.heic");
    }

    #[test]
    fn configured_sets_accept_dotted_entries() {
        let c = ExtensionClassifier::new([".Raw"], ["webm"]);
        assert_eq!(c.kind_of("x.raw"), Some(MediaKind::Image));
        assert_eq!(c.kind_of("x.webm"), Some(MediaKind::Video));
        assert_eq!(c.kind_of("x.jpg"), None);
    }
}

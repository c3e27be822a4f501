//! CNV chart images.
//!
//! The lab exports one chart per sample, named after the sample (`KAVITHAC-KC1_chart.png`).
//! The index pairs each embryo with its chart so renderers can embed it.

use crate::constants::CHART_IMAGE_EXTENSIONS;
use crate::linkage::sample_base;
use crate::{PipelineError, PipelineResult};
use std::path::{Path, PathBuf};

/// Chart images sorted by file name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartImageIndex {
    /// Upper-cased file name paired with the full path.
    entries: Vec<(String, PathBuf)>,
}

impl ChartImageIndex {
    /// Builds an index from image paths. Paths without a chart extension are ignored.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut entries: Vec<(String, PathBuf)> = paths
            .into_iter()
            .filter(|path| is_chart_image(path))
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_uppercase();
                Some((name, path))
            })
            .collect();
        entries.sort();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First image whose file name starts with the sample base, case-insensitively.
    pub fn lookup(&self, sample_name: &str) -> Option<&Path> {
        let base = sample_base(sample_name).to_uppercase();
        if base.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(name, _)| name.starts_with(&base))
            .map(|(_, path)| path.as_path())
    }
}

fn is_chart_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CHART_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Scans `dir` (not recursively) for chart images.
pub fn index_chart_images(dir: &Path) -> PipelineResult<ChartImageIndex> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(PipelineError::FileRead)? {
        let entry = entry.map_err(PipelineError::FileRead)?;
        if entry.file_type().map_err(PipelineError::FileRead)?.is_file() {
            paths.push(entry.path());
        }
    }

    let index = ChartImageIndex::from_paths(paths);
    tracing::debug!(dir = %dir.display(), images = index.len(), "indexed chart images");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_matches_sample_base_prefix() {
        let index = ChartImageIndex::from_paths([
            PathBuf::from("/charts/kavithac-kc2_chart.png"),
            PathBuf::from("/charts/KAVITHAC-KC1_chart.png"),
            PathBuf::from("/charts/notes.txt"),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.lookup("KAVITHAC-KC1_L01_R1"),
            Some(Path::new("/charts/KAVITHAC-KC1_chart.png"))
        );
        assert_eq!(
            index.lookup("KavithaC-KC2_L01_R1"),
            Some(Path::new("/charts/kavithac-kc2_chart.png"))
        );
        assert_eq!(index.lookup("SINDHUR-S1_L01"), None);
        assert_eq!(index.lookup(""), None);
    }

    #[test]
    fn first_image_by_name_wins() {
        let index = ChartImageIndex::from_paths([
            PathBuf::from("b/E1_zoom.jpg"),
            PathBuf::from("a/E1_chart.JPEG"),
        ]);
        assert_eq!(index.lookup("E1_L01"), Some(Path::new("a/E1_chart.JPEG")));
    }

    #[test]
    fn index_scans_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("DHIVYA-DK1_cnv.png"), b"png").expect("write");
        std::fs::write(dir.path().join("readme.md"), b"text").expect("write");
        std::fs::create_dir(dir.path().join("nested.png")).expect("mkdir");

        let index = index_chart_images(dir.path()).expect("index");
        assert_eq!(index.len(), 1);
        assert!(index.lookup("DHIVYA-DK1_L02_R1").is_some());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = index_chart_images(Path::new("/definitely/not/a/dir")).expect_err("missing");
        assert!(matches!(err, PipelineError::FileRead(_)));
    }
}

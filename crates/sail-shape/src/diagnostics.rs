//! PNG dump of intermediate stripe images.

use sail_shape_core::GrayImageView;
use sail_shape_stripe::DiagnosticsSink;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `binary_<name>.png` and `cropped_<name>.png` into a directory.
///
/// Write failures are logged and do not interrupt the measurement.
#[derive(Debug)]
pub struct PngDiagnostics {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngDiagnostics {
    /// Create the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        })
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn save(&mut self, prefix: &str, name: &str, img: &GrayImageView<'_>) {
        let path = self.dir.join(format!("{prefix}_{}.png", file_stem(name)));
        let res = image::save_buffer(
            &path,
            img.data,
            img.width as u32,
            img.height as u32,
            image::ColorType::L8,
        );
        match res {
            Ok(()) => {
                log::debug!("wrote {}", path.display());
                self.written.push(path);
            }
            Err(e) => log::warn!("failed to write {}: {e}", path.display()),
        }
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl DiagnosticsSink for PngDiagnostics {
    fn stripe_binary(&mut self, name: &str, binary: &GrayImageView<'_>) {
        self.save("binary", name, binary);
    }

    fn stripe_overlay(&mut self, name: &str, overlay: &GrayImageView<'_>) {
        self.save("cropped", name, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_shape_core::GrayImage;

    #[test]
    fn writes_named_pngs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = PngDiagnostics::new(dir.path().join("debug")).expect("sink");
        let img = GrayImage::from_fn(12, 5, |x, _| (x * 20) as u8);
        sink.stripe_binary("Bottom", &img.view());
        sink.stripe_overlay("Top mast", &img.view());

        let names: Vec<String> = sink
            .written()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["binary_Bottom.png", "cropped_Top_mast.png"]);

        let back = image::open(&sink.written()[0]).expect("decode").to_luma8();
        assert_eq!((back.width(), back.height()), (12, 5));
        assert_eq!(back.get_pixel(3, 0)[0], 60);
    }
}

use image::RgbaImage;
use image::codecs::png::PngEncoder;
use rfd::FileDialog;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// File name exported memes are written under (uniquified when taken).
pub const EXPORT_BASENAME: &str = "my-meme";

/// Extensions the editor accepts for base and overlay images (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "bmp", "tga", "ico", "tiff", "tif",
];

/// Which scene slot a picked or dropped image is destined for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSlot {
    Base,
    Overlay,
}

/// Result delivered from a background IO job.
pub enum IoResult {
    /// An image file was decoded, ready to enter the scene.
    ImageLoaded {
        slot: ImageSlot,
        pixels: RgbaImage,
        path: PathBuf,
    },
    /// Image decoding failed.
    LoadFailed {
        slot: ImageSlot,
        path: PathBuf,
        error: String,
    },
    /// The flattened meme was written to disk.
    ExportComplete { path: PathBuf },
    /// Flatten or write failed.
    ExportFailed { error: String },
}

/// True when the path's extension looks like an image we can decode.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Show the native file dialog and pick one image path (without loading it).
pub fn pick_image_path(title: &str) -> Option<PathBuf> {
    FileDialog::new()
        .set_title(title)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Multi-select variant for overlay ingestion.
pub fn pick_image_paths(title: &str) -> Vec<PathBuf> {
    FileDialog::new()
        .set_title(title)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_files()
        .unwrap_or_default()
}

/// Decode a file into straight-alpha RGBA pixels.
pub fn decode_image(path: &Path) -> Result<RgbaImage, String> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))
}

// ============================================================================
// EXPORT
// ============================================================================

/// Error type for the export pipeline (flatten, encode, write).
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Encode(image::ImageError),
    Compose(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
            ExportError::Encode(e) => write!(f, "PNG encode error: {}", e),
            ExportError::Compose(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<image::ImageError> for ExportError {
    fn from(e: image::ImageError) -> Self {
        ExportError::Encode(e)
    }
}

/// Write the flattened meme into the user's Downloads directory under the
/// first free `my-meme*.png` name. Standalone so it can run on background
/// threads.
pub fn write_export(image: &RgbaImage) -> Result<PathBuf, ExportError> {
    let dir = downloads_dir();
    std::fs::create_dir_all(&dir)?;
    let path = unique_export_path(&dir);
    encode_png(image, &path)?;
    Ok(path)
}

/// Encode and write a PNG.
pub fn encode_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = PngEncoder::new(&mut writer);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}

/// First free export name in `dir`: `my-meme.png`, then `my-meme-2.png`,
/// `my-meme-3.png`, and so on.
fn unique_export_path(dir: &Path) -> PathBuf {
    let first = dir.join(format!("{EXPORT_BASENAME}.png"));
    if !first.exists() {
        return first;
    }
    let mut n: u32 = 2;
    loop {
        let candidate = dir.join(format!("{EXPORT_BASENAME}-{n}.png"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Platform Downloads directory.
/// Windows: %USERPROFILE%\Downloads; elsewhere $XDG_DOWNLOAD_DIR or
/// ~/Downloads, falling back to the working directory.
pub fn downloads_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(profile) = std::env::var("USERPROFILE") {
            return PathBuf::from(profile).join("Downloads");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DOWNLOAD_DIR") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join("Downloads");
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Fresh scratch directory under the OS temp dir; removed by the caller.
    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "memeforge-test-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn image_paths_are_detected_by_extension() {
        assert!(is_image_path(Path::new("a/b/c.png")));
        assert!(is_image_path(Path::new("UPPER.JPG")));
        assert!(is_image_path(Path::new("pic.webp")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("no_extension")));
        assert!(!is_image_path(Path::new("archive.tar.gz")));
    }

    #[test]
    fn export_names_never_collide() {
        let dir = scratch_dir("names");

        let first = unique_export_path(&dir);
        assert_eq!(first, dir.join("my-meme.png"));
        std::fs::write(&first, b"x").unwrap();

        let second = unique_export_path(&dir);
        assert_eq!(second, dir.join("my-meme-2.png"));
        std::fs::write(&second, b"x").unwrap();

        let third = unique_export_path(&dir);
        assert_eq!(third, dir.join("my-meme-3.png"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn png_written_by_encode_png_decodes_back() {
        let dir = scratch_dir("png");
        let path = dir.join("out.png");

        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(2, 1, Rgba([0, 0, 255, 128]));
        encode_png(&img, &path).unwrap();

        let back = decode_image(&path).unwrap();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(back.get_pixel(2, 1).0, [0, 0, 255, 128]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn decode_failure_names_the_file() {
        let err = decode_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(err.contains("here.png"));
    }
}

use anyhow::{Context, Result};
use image::{ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File suffixes accepted as input images (case-sensitive)
pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// A decoded input image and the path it was read from
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: RgbImage,
    pub path: PathBuf,
}

pub fn is_image_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
}

/// Load every image in `folder` (no recursion), converted to RGB.
///
/// Files that fail to decode are logged and skipped. Order follows the
/// directory listing. Failing to list the folder itself is an error.
pub fn load_images_from_folder(folder: &Path) -> Result<Vec<SourceImage>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("Failed to read input folder {}", folder.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };
        if !path.is_file() || !is_image_file(&path) {
            continue;
        }

        match load_image(&path) {
            Ok(image) => {
                info!("Loaded image: {}", path.display());
                images.push(SourceImage { image, path });
            }
            Err(e) => {
                warn!("Error loading image {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(images)
}

fn load_image(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    Ok(img.to_rgb8())
}

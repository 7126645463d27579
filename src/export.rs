//! Saving history images to disk as PNG files.

use crate::ai::mime::parse_data_uri;
use crate::models::GeneratedImage;
use crate::{Error, Result};
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const DOWNLOAD_PREFIX: &str = "lumina";
pub const DOWNLOAD_EXTENSION: &str = "png";
const PROMPT_PREFIX_CHARS: usize = 20;

/// `lumina-<first 20 prompt chars>.png`, with every run of non-alphanumeric
/// characters collapsed to a single `-`.
pub fn download_file_name(prompt: &str) -> String {
    let mut slug = String::new();
    for c in prompt.trim().chars().take(PROMPT_PREFIX_CHARS) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "image" } else { slug };

    format!("{}-{}.{}", DOWNLOAD_PREFIX, slug, DOWNLOAD_EXTENSION)
}

/// First path in `dir` based on `file_name` that does not exist yet.
fn unused_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .strip_suffix(&format!(".{}", DOWNLOAD_EXTENSION))
        .unwrap_or(file_name);
    (1..)
        .map(|n| dir.join(format!("{}-{}.{}", stem, n, DOWNLOAD_EXTENSION)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn to_png(mime: &str, bytes: Vec<u8>) -> Result<Vec<u8>> {
    if mime.eq_ignore_ascii_case("image/png") {
        return Ok(bytes);
    }

    tracing::debug!("Converting {} image to PNG for export", mime);
    let decoded = image::load_from_memory(&bytes)?;
    let mut png = Vec::new();
    decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn export_image_sync(url: String, prompt: String, dir: PathBuf) -> Result<PathBuf> {
    let (mime, bytes) = parse_data_uri(&url)?;
    let png = to_png(&mime, bytes)?;

    std::fs::create_dir_all(&dir)?;
    let path = unused_path(&dir, &download_file_name(&prompt));
    std::fs::write(&path, png)?;
    Ok(path)
}

/// Write `image` into `dir` and return the path of the new file.
pub async fn export_image(image: &GeneratedImage, dir: &Path) -> Result<PathBuf> {
    let path = tokio::task::spawn_blocking({
        let url = image.url.clone();
        let prompt = image.prompt.clone();
        let dir = dir.to_path_buf();
        move || export_image_sync(url, prompt, dir)
    })
    .await
    .map_err(|e| Error::Invariant(format!("Image export task join error: {}", e)))??;

    tracing::info!("Exported image {} to {}", image.id, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mime::to_data_uri;
    use crate::models::AspectRatio;
    use tempfile::TempDir;

    fn encoded_image(format: ImageFormat) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 30, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn record(mime: &str, bytes: &[u8], prompt: &str) -> GeneratedImage {
        GeneratedImage::new(to_data_uri(mime, bytes), prompt, AspectRatio::Landscape, 0)
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(
            download_file_name("a red fox in snow"),
            "lumina-a-red-fox-in-snow.png"
        );
        assert_eq!(
            download_file_name("A futuristic city with floating neon gardens"),
            "lumina-A-futuristic-city-wi.png"
        );
        assert_eq!(
            download_file_name("  cats   &  dogs?!  "),
            "lumina-cats-dogs.png"
        );
        assert_eq!(download_file_name("../../etc/passwd"), "lumina-etc-passwd.png");
        assert_eq!(download_file_name("!!!"), "lumina-image.png");
        assert_eq!(download_file_name("café au lait"), "lumina-café-au-lait.png");
    }

    #[tokio::test]
    async fn test_export_png_writes_bytes_verbatim() {
        let dir = TempDir::new().unwrap();
        let png = encoded_image(ImageFormat::Png);

        let path = export_image(&record("image/png", &png, "a red fox in snow"), dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("lumina-a-red-fox-in-snow.png"));
        assert_eq!(std::fs::read(&path).unwrap(), png);
    }

    #[tokio::test]
    async fn test_export_converts_jpeg_to_png() {
        let dir = TempDir::new().unwrap();
        let jpeg = encoded_image(ImageFormat::Jpeg);

        let path = export_image(&record("image/jpeg", &jpeg, "a neon city"), dir.path())
            .await
            .unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&written).unwrap(),
            ImageFormat::Png
        );
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[tokio::test]
    async fn test_export_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let png = encoded_image(ImageFormat::Png);
        let image = record("image/png", &png, "same prompt");

        let first = export_image(&image, dir.path()).await.unwrap();
        let second = export_image(&image, dir.path()).await.unwrap();
        let third = export_image(&image, dir.path()).await.unwrap();

        assert_eq!(first.file_name().unwrap(), "lumina-same-prompt.png");
        assert_eq!(second.file_name().unwrap(), "lumina-same-prompt-1.png");
        assert_eq!(third.file_name().unwrap(), "lumina-same-prompt-2.png");
    }

    #[tokio::test]
    async fn test_export_rejects_non_data_url() {
        let dir = TempDir::new().unwrap();
        let mut image = record("image/png", &[], "remote");
        image.url = "https://example.com/image.png".to_string();

        let err = export_image(&image, dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDataUri(_)));
    }
}

use crate::{Error, Result};
use base64::Engine as _;

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                DEFAULT_IMAGE_MIME
            );
            DEFAULT_IMAGE_MIME
        }
    }
}

/// Pick the MIME type for an image: the declared one when present, else sniffed.
pub fn resolve_image_mime<'a>(declared: Option<&'a str>, bytes: &[u8]) -> &'a str {
    match declared.map(str::trim) {
        Some(mime) if !mime.is_empty() => mime,
        _ => detect_image_mime(bytes),
    }
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Split a base64 `data:` URI into its MIME type and decoded payload.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidDataUri("missing 'data:' scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUri("missing ',' separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidDataUri("only base64 payloads are supported".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Decode(e.to_string()))?;

    let mime = if mime.is_empty() {
        detect_image_mime(&bytes)
    } else {
        mime
    };

    Ok((mime.to_string(), bytes))
}

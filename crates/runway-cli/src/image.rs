use anyhow::Context;
use base64::Engine as _;

/// Split a `data:<mime>;base64,<payload>` URL. A bare payload has no mime.
fn split(image: &str) -> (Option<&str>, &str) {
    match image.split_once(',') {
        Some((header, rest)) if header.starts_with("data:") => {
            let mime = header
                .trim_start_matches("data:")
                .split(';')
                .next()
                .filter(|m| !m.is_empty());
            (mime, rest)
        }
        _ => (None, image),
    }
}

/// Decode a `data:` URL or a bare base64 payload.
pub fn decode(image: &str) -> anyhow::Result<Vec<u8>> {
    let (_, payload) = split(image);
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("image is not valid base64")
}

/// File extension for the image's declared mime type, `bin` when unknown.
pub fn extension(image: &str) -> &'static str {
    split(image)
        .0
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|exts| {
            ["png", "jpg", "webp", "gif"]
                .into_iter()
                .find(|e| exts.contains(e))
                .or_else(|| exts.first().copied())
        })
        .unwrap_or("bin")
}

use tracing::warn;

/// Upper bound, in characters, on the source text handed to an AI provider.
pub const MAX_SOURCE_CHARS: usize = 15_000;

pub fn is_pdf(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Pulls plain text out of an uploaded file.
///
/// PDFs go through the structured extractor and fall back to the raw bytes
/// read as text when extraction fails; everything else is read as text directly.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn extract_text(filename: &str, data: &[u8]) -> String {
    if is_pdf(filename) {
        match pdf_extract::extract_text_from_mem(data) {
            Ok(text) => return text,
            Err(e) => {
                warn!("PDF extraction failed for {}, using raw bytes: {}", filename, e);
            }
        }
    }

    String::from_utf8_lossy(data).into_owned()
}

/// Keeps the first `max_chars` characters; no word or sentence re-alignment.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

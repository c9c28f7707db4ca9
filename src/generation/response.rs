//! Extraction of inline image data from service responses.

use crate::document::ImageRef;
use base64::Engine;
use log::debug;
use serde_json::Value;

/// Find the first inline image in a response.
///
/// Looks through `candidates[].content.parts[]` for an `inlineData` object
/// with a `mimeType` and base64 `data`. Responses without image data yield
/// `None`; so do payloads that are not valid base64.
pub fn parse_image_response(response: &Value, prompt: &str) -> Option<ImageRef> {
    let candidates = response.get("candidates")?.as_array()?;

    let image = candidates
        .iter()
        .filter_map(|candidate| candidate.pointer("/content/parts")?.as_array())
        .flatten()
        .filter_map(|part| part.get("inlineData"))
        .find_map(|inline| {
            let mime_type = inline.get("mimeType")?.as_str()?;
            let data = inline.get("data")?.as_str()?;
            if !mime_type.starts_with("image/") || data.is_empty() {
                return None;
            }
            if base64::engine::general_purpose::STANDARD
                .decode(data)
                .is_err()
            {
                debug!("Skipping inline data with invalid base64 payload");
                return None;
            }
            Some(ImageRef::from_base64(mime_type, data, prompt))
        });

    if image.is_none() {
        debug!("No image data found in response");
    }
    image
}

/// Concatenate the text parts of the first candidate.
pub fn parse_text_response(response: &Value) -> Option<String> {
    let parts = response.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text")?.as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

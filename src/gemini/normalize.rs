//! Response normalization: candidate/part tree to a flat result list.
//!
//! Gateways in front of Gemini disagree on the inline image key spelling, and
//! some echo both. The response is therefore walked as a JSON tree with a
//! fixed alias table instead of being deserialized into typed structs.

use crate::mime::DEFAULT_IMAGE_MIME;
use crate::models::ResultItem;
use crate::{Error, Result};
use base64::Engine as _;
use serde_json::{Map, Value};

/// Accepted spellings of the inline image field, in order of preference.
pub const INLINE_DATA_KEYS: [&str; 2] = ["inlineData", "inline_data"];

/// Accepted spellings of the MIME type inside an inline image field.
pub const MIME_TYPE_KEYS: [&str; 2] = ["mimeType", "mime_type"];

/// Flattens a `generateContent` response in candidate-major, part-minor order.
///
/// A response without a `candidates` key counts as "no results" and yields
/// [`Error::EmptyResult`], same as an empty list.
pub fn normalize(body: &Value) -> Result<Vec<ResultItem>> {
    let root = body
        .as_object()
        .ok_or_else(|| Error::UpstreamFormat("response body is not a JSON object".to_string()))?;

    let candidates: &[Value] = match root.get("candidates") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(candidates)) => candidates.as_slice(),
        Some(_) => {
            return Err(Error::UpstreamFormat(
                "`candidates` is not an array".to_string(),
            ))
        }
    };

    let mut items = Vec::new();
    for (candidate_index, candidate) in candidates.iter().enumerate() {
        for part in candidate_parts(candidate) {
            let Some(part) = part.as_object() else {
                continue;
            };

            if let Some(text) = part.get("text").and_then(Value::as_str) {
                items.push(ResultItem::Text {
                    content: text.to_string(),
                });
            }

            if let Some(inline) = lookup(part, &INLINE_DATA_KEYS, Value::as_object) {
                items.push(decode_inline_image(inline, candidate_index)?);
            }
        }
    }

    if items.is_empty() {
        return Err(Error::EmptyResult);
    }

    tracing::debug!(
        "Normalized {} result items from {} candidates",
        items.len(),
        candidates.len()
    );
    Ok(items)
}

fn candidate_parts(candidate: &Value) -> &[Value] {
    candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// First alias whose value has the expected JSON type; `null` or mistyped
/// spellings fall through to the next alias.
fn lookup<'a, T: ?Sized>(
    object: &'a Map<String, Value>,
    keys: &[&str],
    as_kind: fn(&'a Value) -> Option<&'a T>,
) -> Option<&'a T> {
    keys.iter().find_map(|key| object.get(*key).and_then(as_kind))
}

fn decode_inline_image(inline: &Map<String, Value>, candidate_index: usize) -> Result<ResultItem> {
    let data = inline.get("data").and_then(Value::as_str).ok_or_else(|| {
        Error::UpstreamFormat(format!(
            "inline image in candidate {} has no `data` field",
            candidate_index
        ))
    })?;

    // Some gateways line-wrap long payloads
    let compact: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&compact)
        .map_err(|e| Error::UpstreamFormat(format!("failed to decode base64 image: {}", e)))?;

    let mime_type = lookup(inline, &MIME_TYPE_KEYS, Value::as_str)
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();

    Ok(ResultItem::Image { bytes, mime_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(content: &str) -> ResultItem {
        ResultItem::Text {
            content: content.to_string(),
        }
    }

    fn image(bytes: &[u8], mime_type: &str) -> ResultItem {
        ResultItem::Image {
            bytes: bytes.to_vec(),
            mime_type: mime_type.to_string(),
        }
    }

    #[test]
    fn test_text_and_camel_case_image() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"text": "ok"},
            {"inlineData": {"data": "QQ==", "mimeType": "image/png"}}
        ]}}]});

        assert_eq!(
            normalize(&body).unwrap(),
            vec![text("ok"), image(b"A", "image/png")]
        );
    }

    #[test]
    fn test_both_key_spellings_produce_identical_items() {
        let camel = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"data": "QUJD", "mimeType": "image/webp"}}
        ]}}]});
        let snake = json!({"candidates": [{"content": {"parts": [
            {"inline_data": {"data": "QUJD", "mime_type": "image/webp"}}
        ]}}]});

        assert_eq!(normalize(&camel).unwrap(), normalize(&snake).unwrap());
        assert_eq!(normalize(&snake).unwrap(), vec![image(b"ABC", "image/webp")]);
    }

    #[test]
    fn test_camel_case_wins_when_both_spellings_present() {
        let body = json!({"candidates": [{"content": {"parts": [{
            "inline_data": {"data": "Qg==", "mime_type": "image/gif"},
            "inlineData": {"data": "QQ==", "mimeType": "image/jpeg"}
        }]}}]});

        assert_eq!(normalize(&body).unwrap(), vec![image(b"A", "image/jpeg")]);
    }

    #[test]
    fn test_null_camel_case_falls_back_to_snake_case() {
        let body = json!({"candidates": [{"content": {"parts": [{
            "inlineData": null,
            "inline_data": {"data": "QQ==", "mime_type": "image/png"}
        }]}}]});

        assert_eq!(normalize(&body).unwrap(), vec![image(b"A", "image/png")]);
    }

    #[test]
    fn test_null_mime_type_falls_back_to_other_spelling() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"data": "QQ==", "mimeType": null, "mime_type": "image/gif"}}
        ]}}]});

        assert_eq!(normalize(&body).unwrap(), vec![image(b"A", "image/gif")]);
    }

    #[test]
    fn test_line_wrapped_base64_is_decoded() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"data": "QU\nJD", "mimeType": "image/png"}},
            {"inlineData": {"data": " QU\r\nJD\n", "mimeType": "image/png"}}
        ]}}]});

        assert_eq!(
            normalize(&body).unwrap(),
            vec![image(b"ABC", "image/png"), image(b"ABC", "image/png")]
        );
    }

    #[test]
    fn test_missing_mime_defaults_to_png() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"data": "QQ=="}}
        ]}}]});

        assert_eq!(normalize(&body).unwrap(), vec![image(b"A", "image/png")]);
    }

    #[test]
    fn test_part_with_text_and_image_yields_two_items() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"text": "caption", "inlineData": {"data": "QQ==", "mimeType": "image/png"}}
        ]}}]});

        assert_eq!(
            normalize(&body).unwrap(),
            vec![text("caption"), image(b"A", "image/png")]
        );
    }

    #[test]
    fn test_candidate_major_part_minor_order() {
        let body = json!({"candidates": [
            {"content": {"parts": [{"text": "c0p0"}, {"text": "c0p1"}]}},
            {"content": {"parts": [{"text": "c1p0"}, {"inline_data": {"data": "QQ=="}}]}},
            {"content": {"parts": [{"text": "c0p0"}]}}
        ]});

        assert_eq!(
            normalize(&body).unwrap(),
            vec![
                text("c0p0"),
                text("c0p1"),
                text("c1p0"),
                image(b"A", "image/png"),
                text("c0p0"),
            ]
        );
    }

    #[test]
    fn test_round_trip_through_wire_encoding() {
        use crate::gemini::assemble::{assemble, to_wire};
        use crate::models::{AspectRatio, ImageSize, UploadedImage};

        let original: Vec<u8> = (0..=255).collect();
        let request = assemble(
            "echo",
            &[UploadedImage {
                bytes: original.clone(),
                filename: "all.png".to_string(),
            }],
            AspectRatio::default(),
            ImageSize::default(),
        )
        .unwrap();
        let wire = serde_json::to_value(to_wire(&request)).unwrap();
        let echoed = wire["contents"][0]["parts"][1].clone();

        let body = json!({"candidates": [{"content": {"parts": [echoed]}}]});
        assert_eq!(normalize(&body).unwrap(), vec![image(&original, "image/png")]);

        let camel = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {
                "data": base64::engine::general_purpose::STANDARD.encode(&original),
                "mimeType": "image/png"
            }}
        ]}}]});
        assert_eq!(normalize(&camel).unwrap(), normalize(&body).unwrap());
    }

    #[test]
    fn test_empty_candidates_is_empty_result() {
        let err = normalize(&json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, Error::EmptyResult));
    }

    #[test]
    fn test_missing_candidates_is_empty_result() {
        let err = normalize(&json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap_err();
        assert!(matches!(err, Error::EmptyResult));
    }

    #[test]
    fn test_parts_without_usable_fields_are_empty_result() {
        let body = json!({"candidates": [
            {"finishReason": "SAFETY"},
            {"content": {"parts": [{"thought": true}, "stray", 3]}}
        ]});
        assert!(matches!(normalize(&body).unwrap_err(), Error::EmptyResult));
    }

    #[test]
    fn test_non_object_body_is_format_error() {
        for body in [json!([]), json!("candidates"), json!(null)] {
            assert!(matches!(
                normalize(&body).unwrap_err(),
                Error::UpstreamFormat(_)
            ));
        }
    }

    #[test]
    fn test_non_array_candidates_is_format_error() {
        let err = normalize(&json!({"candidates": {"content": {}}})).unwrap_err();
        assert!(matches!(err, Error::UpstreamFormat(_)));
    }

    #[test]
    fn test_invalid_base64_is_format_error() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"data": "!!!invalid-base64!!!", "mimeType": "image/png"}}
        ]}}]});
        assert!(matches!(
            normalize(&body).unwrap_err(),
            Error::UpstreamFormat(_)
        ));
    }

    #[test]
    fn test_inline_image_without_data_is_format_error() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"mimeType": "image/png"}}
        ]}}]});
        assert!(matches!(
            normalize(&body).unwrap_err(),
            Error::UpstreamFormat(_)
        ));
    }
}

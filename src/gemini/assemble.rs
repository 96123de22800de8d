//! Request assembly: prompt, reference images and options to wire envelope.

use super::types::{
    WireBlob, WireContent, WireGenerationConfig, WireImageConfig, WirePart, WireRequest,
    MODALITY_IMAGE, MODALITY_TEXT,
};
use crate::mime::mime_for_filename;
use crate::models::{AspectRatio, ContentPart, GenerationRequest, ImageSize, UploadedImage};
use crate::{Error, Result};
use base64::Engine as _;

/// Builds the ordered content parts for one generation call.
///
/// The prompt is always the first part. Images whose filename does not carry
/// an accepted extension are dropped without failing the request.
pub fn assemble(
    prompt: &str,
    images: &[UploadedImage],
    aspect_ratio: AspectRatio,
    image_size: ImageSize,
) -> Result<GenerationRequest> {
    if prompt.trim().is_empty() {
        return Err(Error::Validation("Please enter a prompt".to_string()));
    }

    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(ContentPart::Text {
        text: prompt.to_string(),
    });

    for image in images {
        match mime_for_filename(&image.filename) {
            Some(mime_type) => parts.push(ContentPart::Image {
                bytes: image.bytes.clone(),
                mime_type,
            }),
            None => {
                tracing::debug!("Skipping upload with unsupported filename '{}'", image.filename);
            }
        }
    }

    Ok(GenerationRequest {
        parts,
        aspect_ratio,
        image_size,
    })
}

/// Encodes a request into the exact JSON envelope the remote API expects.
pub fn to_wire(request: &GenerationRequest) -> WireRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => WirePart::Text { text: text.clone() },
            ContentPart::Image { bytes, mime_type } => WirePart::InlineData {
                inline_data: WireBlob {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(bytes),
                },
            },
        })
        .collect();

    envelope(
        parts,
        vec![MODALITY_TEXT.to_string(), MODALITY_IMAGE.to_string()],
        request.aspect_ratio,
        request.image_size,
    )
}

/// Text-only probe used to check that the endpoint and key are accepted.
pub fn connection_test(text: &str) -> WireRequest {
    envelope(
        vec![WirePart::Text {
            text: text.to_string(),
        }],
        vec![MODALITY_TEXT.to_string()],
        AspectRatio::default(),
        ImageSize::default(),
    )
}

fn envelope(
    parts: Vec<WirePart>,
    response_modalities: Vec<String>,
    aspect_ratio: AspectRatio,
    image_size: ImageSize,
) -> WireRequest {
    WireRequest {
        contents: vec![WireContent { parts }],
        generation_config: WireGenerationConfig {
            response_modalities,
            image_config: WireImageConfig {
                aspect_ratio: aspect_ratio.as_str().to_string(),
                image_size: image_size.as_str().to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn upload(name: &str, bytes: &[u8]) -> UploadedImage {
        UploadedImage {
            bytes: bytes.to_vec(),
            filename: name.to_string(),
        }
    }

    #[test]
    fn test_text_only_request_matches_wire_format() {
        let request = assemble("a red cube", &[], AspectRatio::Square, ImageSize::TwoK).unwrap();
        let wire = serde_json::to_value(to_wire(&request)).unwrap();

        assert_eq!(
            wire,
            json!({
                "contents": [{"parts": [{"text": "a red cube"}]}],
                "generationConfig": {
                    "responseModalities": ["TEXT", "IMAGE"],
                    "imageConfig": {"aspectRatio": "1:1", "imageSize": "2K"}
                }
            })
        );
    }

    #[test]
    fn test_prompt_is_first_and_images_keep_upload_order() {
        let images = [upload("b.webp", b"second"), upload("a.PNG", b"first")];
        let request = assemble("mix these", &images, AspectRatio::default(), ImageSize::default())
            .unwrap();

        assert_eq!(
            request.parts,
            vec![
                ContentPart::Text {
                    text: "mix these".to_string()
                },
                ContentPart::Image {
                    bytes: b"second".to_vec(),
                    mime_type: "image/webp".to_string()
                },
                ContentPart::Image {
                    bytes: b"first".to_vec(),
                    mime_type: "image/png".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_disallowed_uploads_are_skipped() {
        let images = [
            upload("notes.txt", b"x"),
            upload("", b"x"),
            upload("noext", b"x"),
            upload("ok.jpg", b"y"),
        ];
        let request = assemble("p", &images, AspectRatio::default(), ImageSize::default()).unwrap();

        assert_eq!(request.parts.len(), 2);
        assert!(matches!(request.parts[0], ContentPart::Text { .. }));
        assert_eq!(
            request.parts[1],
            ContentPart::Image {
                bytes: b"y".to_vec(),
                mime_type: "image/jpeg".to_string()
            }
        );
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        for prompt in ["", "   ", "\n\t"] {
            let err = assemble(prompt, &[], AspectRatio::default(), ImageSize::default())
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_prompt_is_not_trimmed() {
        let request = assemble("  spaced  ", &[], AspectRatio::default(), ImageSize::default())
            .unwrap();
        assert_eq!(
            request.parts[0],
            ContentPart::Text {
                text: "  spaced  ".to_string()
            }
        );
    }

    #[test]
    fn test_image_part_uses_snake_case_inline_data() {
        let request = assemble(
            "edit",
            &[upload("x.gif", b"A")],
            AspectRatio::Landscape16x9,
            ImageSize::FourK,
        )
        .unwrap();
        let wire = serde_json::to_value(to_wire(&request)).unwrap();

        assert_eq!(
            wire["contents"][0]["parts"][1],
            json!({"inline_data": {"mime_type": "image/gif", "data": "QQ=="}})
        );
        assert_eq!(
            wire["generationConfig"]["imageConfig"],
            json!({"aspectRatio": "16:9", "imageSize": "4K"})
        );
    }

    #[test]
    fn test_connection_test_requests_text_only() {
        let wire = serde_json::to_value(connection_test("Test API connection")).unwrap();
        assert_eq!(wire["generationConfig"]["responseModalities"], json!(["TEXT"]));
        assert_eq!(
            wire["contents"][0]["parts"][0]["text"],
            "Test API connection"
        );
    }
}

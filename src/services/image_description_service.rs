use crate::models::image::InlineImage;
use crate::services::llm::LlmError;
use crate::services::model_selector::ModelHandle;

pub const IMAGE_DESCRIPTION_PROMPT: &str = "Describe these image(s) in a detailed paragraph as though it was a tourist destination.\n\
Do not give the name of the location, only give a description of what you see in the image \
and what you think a tourist would like it described as in a dream vacation.";

/// Describes the uploaded images as one tourist-destination paragraph.
///
/// No images means no model call and an empty description.
pub async fn describe_images(images: &[InlineImage], model: &ModelHandle) -> Result<String, LlmError> {
    if images.is_empty() {
        return Ok(String::new());
    }

    log::info!(
        "Generating image description for {} image(s) using {}",
        images.len(),
        model.label()
    );

    let description = model
        .model()
        .generate_text(IMAGE_DESCRIPTION_PROMPT, images)
        .await?;

    log::debug!("Image description generated: {}", description);
    Ok(description)
}

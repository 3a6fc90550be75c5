use actix_multipart::{Multipart, MultipartError};
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use futures::TryStreamExt;
use serde_json::json;

use crate::models::{
    image::InlineImage,
    trip_request::{ModelChoice, TripRequest},
};
use crate::services::image_service::{to_inline_image, ImageError};
use crate::services::itinerary_flow::FlowError;
use crate::state::AppState;

const REQUEST_FIELD: &str = "request";
const MODEL_CHOICE_FIELD: &str = "modelChoice";
const IMAGE_FIELDS: [&str; 2] = ["images[]", "images"];
/// Cap for the `request` and `modelChoice` text fields.
pub const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

#[derive(Debug, Default)]
struct TripForm {
    request: Option<String>,
    images: Vec<InlineImage>,
    model_choice: Option<String>,
}

fn upload_error(err: MultipartError) -> ImageError {
    ImageError::Upload(err.to_string())
}

async fn read_trip_form(mut payload: Multipart, max_image_bytes: usize) -> Result<TripForm, ImageError> {
    let mut form = TripForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let is_image = IMAGE_FIELDS.contains(&name.as_str());
        let is_text = name == REQUEST_FIELD || name == MODEL_CHOICE_FIELD;

        if !is_image && !is_text {
            // Unknown fields are counted, never buffered.
            let mut size = 0;
            while let Some(chunk) = field.try_next().await.map_err(upload_error)? {
                size += chunk.len();
                if size > MAX_TEXT_FIELD_BYTES {
                    return Err(ImageError::FieldTooLarge {
                        field: name,
                        limit: MAX_TEXT_FIELD_BYTES,
                    });
                }
            }
            log::debug!("Ignoring form field '{}' ({} bytes)", name, size);
            continue;
        }

        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(upload_error)? {
            bytes.extend_from_slice(&chunk);
            if is_image && bytes.len() > max_image_bytes {
                return Err(ImageError::TooLarge {
                    file_name: file_name.unwrap_or_else(|| "upload".to_string()),
                    size: bytes.len(),
                    limit: max_image_bytes,
                });
            }
            if is_text && bytes.len() > MAX_TEXT_FIELD_BYTES {
                return Err(ImageError::FieldTooLarge {
                    field: name,
                    limit: MAX_TEXT_FIELD_BYTES,
                });
            }
        }

        match name.as_str() {
            REQUEST_FIELD => form.request = Some(String::from_utf8_lossy(&bytes).into_owned()),
            MODEL_CHOICE_FIELD => {
                form.model_choice = Some(String::from_utf8_lossy(&bytes).trim().to_string())
            }
            _ => {
                if let Some(image) = to_inline_image(
                    &bytes,
                    content_type.as_deref(),
                    file_name.as_deref(),
                    max_image_bytes,
                )? {
                    form.images.push(image);
                }
            }
        }
    }

    Ok(form)
}

/*
    /api/itineraries/generate
*/
pub async fn generate(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, FlowError> {
    let form = read_trip_form(payload, state.max_image_bytes).await?;

    let trip = TripRequest::new(
        form.request.unwrap_or_default(),
        form.images,
        ModelChoice::from_token(form.model_choice.as_deref()),
    )?;

    let itineraries = tokio::time::timeout(state.flow_timeout, state.flow.run(&trip))
        .await
        .map_err(|_| {
            log::error!("Itinerary flow exceeded {:?}", state.flow_timeout);
            FlowError::DeadlineExceeded(state.flow_timeout)
        })??;

    Ok(HttpResponse::Ok().json(itineraries))
}

impl ResponseError for FlowError {
    fn status_code(&self) -> StatusCode {
        match self {
            FlowError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FlowError::InvalidImage(ImageError::TooLarge { .. })
            | FlowError::InvalidImage(ImageError::FieldTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            FlowError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            FlowError::ImageDescription(_)
            | FlowError::Retrieval(_)
            | FlowError::Generation { .. } => StatusCode::BAD_GATEWAY,
            FlowError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

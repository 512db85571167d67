use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::multipart::{Multipart, MultipartRejection},
};
use segmentation::InputError;

/// Name of the multipart field carrying the photograph.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Pull the `image` file out of a multipart request.
///
/// A request that is not multipart, or whose `image` field is not a file,
/// counts as having no image at all.
pub async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not multipart");
        InputError::MissingFile
    })?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(InputError::EmptyFilename.into());
        }

        let bytes = field.bytes().await?;

        tracing::debug!(filename = %filename, bytes = bytes.len(), "Received upload");

        return Ok(Upload { filename, bytes });
    }

    Err(InputError::MissingFile.into())
}

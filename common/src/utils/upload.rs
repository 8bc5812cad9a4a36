use super::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadValidationError {
    UnsupportedType(String),
    PayloadTooLarge(String),
}

pub fn validate_upload(
    config: &AppConfig,
    file_name: &str,
    content_type: Option<&str>,
    size_bytes: usize,
) -> Result<(), UploadValidationError> {
    let pdf_name = file_name.to_ascii_lowercase().ends_with(".pdf");
    let pdf_mime = content_type.is_some_and(|mime| mime.eq_ignore_ascii_case("application/pdf"));

    if !pdf_name && !pdf_mime {
        return Err(UploadValidationError::UnsupportedType(format!(
            "Only PDF documents are supported, got '{}'",
            file_name
        )));
    }

    if size_bytes > config.upload_max_bytes {
        return Err(UploadValidationError::PayloadTooLarge(format!(
            "Document is too large. Maximum allowed is {} bytes",
            config.upload_max_bytes
        )));
    }

    Ok(())
}

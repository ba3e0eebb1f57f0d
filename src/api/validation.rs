use std::path::Path;

use crate::api::errors::ApiError;

pub(crate) fn validate_upload(filename: &str, allowed_extensions: &[String]) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["pdf".to_string(), "txt".to_string()]
    }

    #[test]
    fn accepts_allowed_extension_case_insensitively() {
        assert!(validate_upload("essay.PDF", &allowed()).is_ok());
        assert!(validate_upload("notes.txt", &allowed()).is_ok());
    }

    #[test]
    fn rejects_missing_or_unlisted_extension() {
        assert!(validate_upload("script.exe", &allowed()).is_err());
        assert!(validate_upload("noextension", &allowed()).is_err());
    }
}

//! Reviews dataset upload
//!
//! Files are checked locally (present, non-empty, supported extension)
//! before anything is sent.

use std::path::Path;

use tracing::info;

use crate::domain::analysis::UploadAnalysisResponse;
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::error::ApiError;
use crate::infrastructure::transport::MultipartFile;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["json", "csv", "xlsx"];
pub const UPLOAD_FIELD_NAME: &str = "file";
const SELECT_FILE_MESSAGE: &str = "Select a .json, .csv or .xlsx file";

/// A file chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ApiError::validation("file", SELECT_FILE_MESSAGE))?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::validation("file", format!("Cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self { file_name, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let supported = self
            .extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            return Err(ApiError::validation("file", SELECT_FILE_MESSAGE));
        }
        if self.bytes.is_empty() {
            return Err(ApiError::validation("file", format!("{} is empty", self.file_name)));
        }
        Ok(())
    }

    fn into_multipart(self) -> MultipartFile {
        MultipartFile {
            field_name: UPLOAD_FIELD_NAME.to_string(),
            file_name: self.file_name,
            bytes: self.bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadService {
    client: ApiClient,
}

impl UploadService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `None` is an empty selection and fails validation like a bad file
    pub async fn upload(&self, file: Option<UploadFile>) -> Result<UploadAnalysisResponse, ApiError> {
        let file = file.ok_or_else(|| ApiError::validation("file", SELECT_FILE_MESSAGE))?;
        file.validate()?;

        info!("📤 Uploading {} ({} bytes)", file.file_name, file.bytes.len());
        let response = self.client.upload_reviews_file(file.into_multipart()).await?;
        info!(
            "📊 Upload analyzed: {} reviews for '{}'",
            response.total_reviews, response.product_name
        );
        Ok(response)
    }
}

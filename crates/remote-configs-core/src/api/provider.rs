use std::collections::HashMap;

use async_trait::async_trait;

use super::ApiError;
use crate::snapshot::ConfigSnapshot;

/// Performs one HTTP GET and returns the parsed configuration document.
///
/// `Ok(None)` means the server answered but gave no usable JSON object. The
/// store treats it the same as an `Err`.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn request_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Option<ConfigSnapshot>, ApiError>;
}

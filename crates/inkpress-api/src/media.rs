//! External object-storage relay
//!
//! Images never touch local disk: multipart uploads are streamed through to
//! the storage provider's signed upload endpoint, and replaced images are
//! destroyed by `public_id`. Accounts registered without an avatar get a
//! generated-initials image fetched from the avatar service and relayed
//! into storage like any other upload.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use inkpress_core::{MediaAsset, MediaConfig};

use crate::error::AppError;

/// Provider response for a successful upload
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Clone)]
pub struct MediaRelay {
    http: reqwest::Client,
    config: MediaConfig,
}

impl MediaRelay {
    pub fn new(config: MediaConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.base_url, self.config.cloud_name, action
        )
    }

    /// Upload image bytes and return the stored asset reference
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<MediaAsset, AppError> {
        let public_id = format!("inkpress/{}", Uuid::new_v4());
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", &public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
            )
            .text("public_id", public_id)
            .text("timestamp", timestamp)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("media upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "media upload rejected");
            return Err(AppError::Internal("Image Upload Failed".to_string()));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("media upload response invalid: {e}")))?;

        Ok(MediaAsset {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    /// Destroy a stored asset by its `public_id`
    ///
    /// Failures are logged and swallowed: an orphaned image must not fail
    /// the mutation that replaced it.
    pub async fn destroy(&self, public_id: &str) {
        if public_id.is_empty() {
            // Nothing is stored under an empty id
            return;
        }
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let result = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(public_id, status = %response.status(), "media destroy rejected");
            }
            Err(e) => {
                tracing::warn!(public_id, error = %e, "media destroy failed");
            }
            _ => {}
        }
    }

    /// Generated-initials avatar for accounts registered without an image
    ///
    /// The image is fetched from the avatar service and relayed into object
    /// storage, so a placeholder behaves exactly like an uploaded avatar:
    /// stable URL, destroyable `public_id`.
    pub async fn placeholder_avatar(&self, name: &str) -> Result<MediaAsset, AppError> {
        let url = self.placeholder_url(name);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("avatar generation failed: {e}")))?;
        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "avatar service rejected request");
            return Err(AppError::Internal("Avatar Generation Failed".to_string()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Internal(format!("avatar generation failed: {e}")))?;

        self.upload(bytes.to_vec(), "avatar.png").await
    }

    fn placeholder_url(&self, name: &str) -> String {
        reqwest::Url::parse_with_params(
            &format!("{}/", self.config.avatar_service_url),
            &[("name", name), ("background", "random")],
        )
        .map(String::from)
        .unwrap_or_else(|_| format!("{}/", self.config.avatar_service_url))
    }
}

/// Provider request signature: sorted `key=value` pairs joined with `&`,
/// secret appended, SHA-256, lowercase hex
fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    let joined: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let payload = format!("{}{}", joined.join("&"), secret);

    let digest = Sha256::digest(payload.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_order_independent() {
        let a = sign_params(&[("timestamp", "100"), ("public_id", "x/y")], "s3cret");
        let b = sign_params(&[("public_id", "x/y"), ("timestamp", "100")], "s3cret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let a = sign_params(&[("timestamp", "100")], "one");
        let b = sign_params(&[("timestamp", "100")], "two");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_placeholder_url_encodes_name() {
        let relay = MediaRelay::new(MediaConfig::default()).unwrap();
        let url = relay.placeholder_url("Ann Lee");
        assert!(url.contains("name=Ann+Lee") || url.contains("name=Ann%20Lee"));
    }
}

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client,
    config::{Credentials, Region},
    primitives::ByteStream,
};
use serde::Serialize;

use crate::{
    common::{ApiError, ApiResult},
    config::{S3Config, UploadsConfig},
    id,
};

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub url: String,
    pub filename: String,
}

#[derive(Clone)]
struct S3Target {
    client: S3Client,
    bucket: String,
    prefix: String,
    public_base_url: Option<String>,
}

/// Where part images end up: the local uploads directory, or a bucket when S3 is enabled.
#[derive(Clone)]
pub struct UploadStore {
    config: Arc<UploadsConfig>,
    s3: Option<S3Target>,
}

impl UploadStore {
    pub fn local(config: UploadsConfig) -> Self {
        UploadStore {
            config: Arc::new(config),
            s3: None,
        }
    }

    pub async fn from_config(uploads: &UploadsConfig, s3: &S3Config) -> anyhow::Result<Self> {
        let mut store = UploadStore::local(uploads.clone());

        if !s3.enabled() {
            return Ok(store);
        }

        let bucket = s3
            .bucket()
            .ok_or_else(|| anyhow::anyhow!("s3 bucket is required when s3.enabled=true"))?;
        let region = s3
            .region()
            .ok_or_else(|| anyhow::anyhow!("s3 region is required when s3.enabled=true"))?;

        store.s3 = Some(S3Target {
            client: build_s3_client(s3, region).await,
            bucket: bucket.to_string(),
            prefix: s3.prefix().to_string(),
            public_base_url: s3.public_base_url().map(str::to_string),
        });

        tracing::info!(bucket, "uploads stored in S3");

        Ok(store)
    }

    pub fn dir(&self) -> PathBuf {
        PathBuf::from(self.config.dir())
    }

    pub fn public_prefix(&self) -> &str {
        self.config.public_prefix()
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size_bytes()
    }

    pub async fn store(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<StoredFile> {
        if !is_image(content_type) {
            return Err(ApiError::validation("Only image files are allowed"));
        }
        if bytes.is_empty() {
            return Err(ApiError::validation("Uploaded file is empty"));
        }
        if bytes.len() > self.max_file_size() {
            return Err(ApiError::validation("File too large"));
        }

        let filename = stored_file_name(original_name, &id::next());

        let url = match &self.s3 {
            Some(target) => upload_to_s3(target, &filename, content_type, bytes).await?,
            None => self.write_local(&filename, bytes).await?,
        };

        tracing::info!(%filename, %url, "image stored");

        Ok(StoredFile { url, filename })
    }

    async fn write_local(&self, filename: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let dir = self.dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("can not create upload dir {:?}", dir))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("fail when write upload {:?}", path))?;

        Ok(format!(
            "{}/{}",
            self.public_prefix().trim_end_matches('/'),
            filename
        ))
    }
}

pub fn is_image(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// `<sanitized base>-<unique id><ext>`; the base keeps only ASCII letters, digits, `_` and `-`.
pub fn stored_file_name(original: &str, unique: &str) -> String {
    let original = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let (base, ext) = match original.rfind('.') {
        Some(idx) if idx > 0 => (&original[..idx], &original[idx..]),
        _ => (original, ""),
    };

    let base: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect::<String>()
        .to_ascii_lowercase();

    if base.is_empty() {
        format!("image-{unique}{ext}")
    } else {
        format!("{base}-{unique}{ext}")
    }
}

async fn build_s3_client(cfg: &S3Config, region: &str) -> S3Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let Some(endpoint) = cfg.endpoint() {
        loader = loader.endpoint_url(endpoint);
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);

    if let (Some(access_key), Some(secret)) = (cfg.access_key_id(), cfg.secret_access_key()) {
        builder = builder
            .credentials_provider(Credentials::new(access_key, secret, None, None, "static"));
    }

    if let Some(endpoint) = cfg.endpoint() {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    S3Client::from_conf(builder.build())
}

async fn upload_to_s3(
    target: &S3Target,
    filename: &str,
    content_type: &str,
    body: Vec<u8>,
) -> anyhow::Result<String> {
    let key = if target.prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", target.prefix, filename)
    };

    target
        .client
        .put_object()
        .bucket(&target.bucket)
        .key(&key)
        .content_type(content_type)
        .body(ByteStream::from(body))
        .send()
        .await
        .with_context(|| format!("failed to upload {key} to s3"))?;

    Ok(match &target.public_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
        None => format!("s3://{}/{}", target.bucket, key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            stored_file_name("brake pad (front).PNG", "abc"),
            "brakepadfront-abc.png"
        );
        assert_eq!(stored_file_name("../../etc/passwd", "abc"), "passwd-abc");
        assert_eq!(stored_file_name(".jpg", "abc"), "image-abc.jpg");
        assert_eq!(stored_file_name("chain_kit-1.jpeg", "x1"), "chain_kit-1-x1.jpeg");
    }

    #[test]
    fn only_images_are_accepted() {
        assert!(is_image("image/png"));
        assert!(is_image("IMAGE/JPEG"));
        assert!(!is_image("application/pdf"));
        assert!(!is_image(""));
    }

    #[tokio::test]
    async fn stores_locally_under_public_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::local(UploadsConfig::new(dir.path().to_string_lossy()));

        let stored = store
            .store("chain.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/chain-"));
        assert!(stored.filename.ends_with(".png"));
        let written = std::fs::read(dir.path().join(&stored.filename)).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rejects_non_images_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::local(UploadsConfig::new(dir.path().to_string_lossy()));

        assert!(matches!(
            store.store("a.pdf", "application/pdf", vec![1]).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            store.store("a.png", "image/png", vec![]).await,
            Err(ApiError::Validation(_))
        ));
    }
}

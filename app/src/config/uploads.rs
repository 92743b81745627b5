use bytesize::ByteSize;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UploadsConfig {
    dir: Option<String>,
    public_prefix: Option<String>,
    max_file_size_bytes: Option<usize>,
}

impl UploadsConfig {
    pub fn new(dir: impl Into<String>) -> Self {
        UploadsConfig {
            dir: Some(dir.into()),
            ..Default::default()
        }
    }

    pub fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or("uploads")
    }

    pub fn public_prefix(&self) -> &str {
        self.public_prefix.as_deref().unwrap_or("/uploads")
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_bytes
            .unwrap_or(ByteSize::mib(5).as_u64() as usize)
    }
}

use tokio::task;

use crate::common::{ApiError, ApiResult};

/// bcrypt hashing off the async executor.
#[derive(Debug, Clone, Copy)]
pub struct Passwords {
    cost: u32,
}

impl Passwords {
    pub fn new(cost: u32) -> Self {
        Passwords { cost }
    }

    pub async fn hash(&self, password: &str) -> ApiResult<String> {
        let password = password.to_string();
        let cost = self.cost;

        let hashed = task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::InternalServerError(e.into()))??;

        Ok(hashed)
    }

    pub async fn verify(&self, password: &str, hashed: &str) -> ApiResult<bool> {
        let password = password.to_string();
        let hashed = hashed.to_string();

        let matched = task::spawn_blocking(move || bcrypt::verify(password, &hashed))
            .await
            .map_err(|e| ApiError::InternalServerError(e.into()))??;

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::Passwords;

    #[tokio::test]
    async fn hash_then_verify() {
        let passwords = Passwords::new(4);
        let hashed = passwords.hash("s3cret").await.unwrap();
        assert_ne!(hashed, "s3cret");
        assert!(passwords.verify("s3cret", &hashed).await.unwrap());
        assert!(!passwords.verify("wrong", &hashed).await.unwrap());
    }
}

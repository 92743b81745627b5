use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    cost: Option<u32>,
    admin_email: Option<String>,
    admin_name: Option<String>,
    admin_password: Option<String>,
}

impl AuthConfig {
    pub fn cost(&self) -> u32 {
        self.cost.unwrap_or(bcrypt::DEFAULT_COST)
    }

    pub fn admin_email(&self) -> &str {
        self.admin_email.as_deref().unwrap_or("admin@gmail.com")
    }

    pub fn admin_name(&self) -> &str {
        self.admin_name.as_deref().unwrap_or("admin")
    }

    /// Seeding is skipped when no password is configured.
    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref().filter(|p| !p.is_empty())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            cost: None,
            admin_email: None,
            admin_name: None,
            admin_password: None,
        }
    }
}

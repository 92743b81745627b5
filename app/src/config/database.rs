use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    url: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
    schema: Option<String>,
}

impl DatabaseConfig {
    /// Full connection url. An explicit `url` wins over the individual postgres fields.
    pub fn url(&self) -> String {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }

        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username(),
            self.password(),
            self.host(),
            self.port(),
            self.database()
        )
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(5432)
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("postgres")
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or("bike_parts")
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or("public")
    }

    pub fn is_postgres(&self) -> bool {
        self.url().starts_with("postgres")
    }
}

use std::env;

#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    /// Base URL the short recipe links are built from.
    pub public_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let public_url =
            env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        Ok(ServerConfig {
            database_url,
            jwt_secret,
            listen_addr,
            public_url,
        })
    }
}

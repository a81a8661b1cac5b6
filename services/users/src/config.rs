/// Users service configuration loaded from environment variables.
#[derive(Debug)]
pub struct UsersConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3113). Env var: `USERS_PORT`.
    pub users_port: u16,
    /// Role id linked to every new user. Env var: `DEFAULT_ROLE_ID`.
    pub default_role_id: String,
}

impl UsersConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            users_port: parse_port(std::env::var("USERS_PORT").ok().as_deref()),
            default_role_id: std::env::var("DEFAULT_ROLE_ID").expect("DEFAULT_ROLE_ID"),
        }
    }
}

fn parse_port(value: Option<&str>) -> u16 {
    value.and_then(|v| v.parse().ok()).unwrap_or(3113)
}

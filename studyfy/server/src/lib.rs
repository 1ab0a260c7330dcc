pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Shared secret the identity provider signs session tokens with.
        pub jwt_secret: String,
        #[serde(default = "default_session_cookie")]
        pub session_cookie: String,
        #[serde(default = "default_sign_in_url")]
        pub sign_in_url: String,
        #[serde(default = "default_sign_up_url")]
        pub sign_up_url: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_session_cookie() -> String {
        "__session".to_string()
    }

    fn default_sign_in_url() -> String {
        "/sign-in".to_string()
    }

    fn default_sign_up_url() -> String {
        "/sign-up".to_string()
    }
}
pub mod auth;
pub mod entities;
pub mod task;
pub mod web;

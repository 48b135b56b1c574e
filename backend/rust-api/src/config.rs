use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_env: String,
    pub bind_addr: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub judge_url: String,
    pub judge_client_id: String,
    pub judge_client_secret: String,
    pub client_build_dir: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", app_env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:5001".to_string());

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGODB_URI"))
            .unwrap_or_else(|_| {
                if app_env == "prod" {
                    panic!("FATAL: MONGODB_URI must be set in production!");
                }
                eprintln!("WARNING: Using default MongoDB URI (dev mode only!)");
                "mongodb://localhost:27017".to_string()
            });

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "FOW".to_string());

        let openai_api_key = settings
            .get_string("openai.api_key")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_else(|_| {
                if app_env == "prod" {
                    panic!("FATAL: OPENAI_API_KEY must be set in production!");
                }
                eprintln!("WARNING: OPENAI_API_KEY not set; tutoring endpoints will fail");
                String::new()
            });

        let openai_base_url = settings
            .get_string("openai.base_url")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let openai_model = settings
            .get_string("openai.model")
            .or_else(|_| env::var("OPENAI_MODEL"))
            .unwrap_or_else(|_| "gpt-4o".to_string());

        let judge_url = settings
            .get_string("judge.url")
            .or_else(|_| env::var("JDOODLE_URL"))
            .unwrap_or_else(|_| "https://api.jdoodle.com/v1/execute".to_string());

        let judge_client_id = settings
            .get_string("judge.client_id")
            .or_else(|_| env::var("JDOODLE_CLIENT_ID"))
            .unwrap_or_else(|_| {
                if app_env == "prod" {
                    panic!("FATAL: JDOODLE_CLIENT_ID must be set in production!");
                }
                eprintln!("WARNING: JDOODLE_CLIENT_ID not set; /api/execute will fail");
                String::new()
            });

        let judge_client_secret = settings
            .get_string("judge.client_secret")
            .or_else(|_| env::var("JDOODLE_CLIENT_SECRET"))
            .unwrap_or_default();

        let client_build_dir = settings
            .get_string("server.client_build_dir")
            .or_else(|_| env::var("CLIENT_BUILD_DIR"))
            .unwrap_or_else(|_| "client/build".to_string());

        Ok(Config {
            app_env,
            bind_addr,
            mongo_uri,
            mongo_database,
            openai_api_key,
            openai_base_url,
            openai_model,
            judge_url,
            judge_client_id,
            judge_client_secret,
            client_build_dir,
        })
    }
}

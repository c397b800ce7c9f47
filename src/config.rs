#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub llm_url: String,
    pub llm_api_key: String,
    pub model_name: String,
    pub frontend_url: String,
}

impl Config {
    /// Reads the environment once at startup. Missing required variables abort
    /// the process before the server binds.
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let llm_api_key = std::env::var("LLM_API_KEY").expect("LLM_API_KEY must be set");
        let frontend_url = std::env::var("FRONTEND_URL").expect("FRONTEND_URL must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);
        let llm_url =
            std::env::var("LLM_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
        let model_name = std::env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o".to_string());

        Config {
            database_url,
            jwt_secret,
            jwt_maxage: jwt_maxage
                .parse::<i64>()
                .expect("JWT_MAXAGE must be a number of seconds"),
            port,
            llm_url,
            llm_api_key,
            model_name,
            frontend_url,
        }
    }
}

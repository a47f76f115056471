use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub stripe_webhook_secret: Option<String>,
    pub currency: String,
    pub platform_fee_percent: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set (HS256 signing secret)"),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY must be set"),
            stripe_api_base: env::var("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com/v1".to_string()),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            platform_fee_percent: env::var("PLATFORM_FEE_PERCENT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("PLATFORM_FEE_PERCENT must be a number"),
        }
    }
}

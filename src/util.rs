const SCRAPER_URL: &str = "SCRAPER_URL";

const DEFAULT_FEED_URL: &str = "http://127.0.0.1:5001";

pub fn get_default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

/// Feed URL from the environment, if set
pub fn get_feed_url() -> Option<String> {
    std::env::var(SCRAPER_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

const API_TOKEN: &str = "FEEDWATCH_API_TOKEN";

pub fn get_api_token() -> Option<String> {
    let token_from_env = std::env::var(API_TOKEN);
    token_from_env.ok()
}

pub mod allsports;
pub mod api_football;
pub mod feeds;
pub mod http;
pub mod supabase;
pub mod youtube;

pub use allsports::AllSportsClient;
pub use api_football::ApiFootballClient;
pub use feeds::HttpFeedFetcher;
pub use http::build_client;
pub use supabase::SupabasePollRepository;
pub use youtube::YouTubeClient;

use serde_json::Value;

/// Ids and counters arrive as numbers from one provider and strings from
/// another.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

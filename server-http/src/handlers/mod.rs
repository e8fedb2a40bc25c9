pub mod admin;
pub mod feeds;
pub mod health;
pub mod polls;

pub use admin::{
    activate_poll, admin_page, create_poll, deactivate_poll, list_polls, quota_status,
};
pub use feeds::{list_channels, list_news, list_scores, list_videos};
pub use health::health_check;
pub use polls::{active_poll, cast_vote};

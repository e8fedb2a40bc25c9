use pitchside::adapters::{
    AllSportsClient, ApiFootballClient, HttpFeedFetcher, SupabasePollRepository, YouTubeClient,
    build_client,
};
use pitchside::aggregation::{
    ChannelDirectory, NewsAggregator, ScoreAggregator, ScoreFailover, VideoAggregator,
};
use pitchside::auth::AdminGate;
use pitchside::persistence::MemoryPollRepository;
use pitchside::polls::{PollAdmin, PollEngine};
use pitchside::ports::{FeedFetcher, PollRepository, ScoreProvider, VideoCatalog};
use pitchside::quota::QuotaGovernor;
use shared::config::Config;
use shared::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{info, warn};

/// Outside-world dependencies the services are built on.
pub struct Collaborators {
    pub catalog: Arc<dyn VideoCatalog>,
    pub feeds: Arc<dyn FeedFetcher>,
    /// Tried in order; the first is primary.
    pub score_providers: Vec<Arc<dyn ScoreProvider>>,
    pub polls: Arc<dyn PollRepository>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Real upstream clients, sharing one HTTP client.
    pub fn from_config(config: &Config) -> shared::Result<Self> {
        let http = build_client(config.upstream_timeout)?;

        let catalog = Arc::new(YouTubeClient::new(
            http.clone(),
            config.endpoints.youtube.as_str(),
            config.youtube_api_key.clone(),
        ));
        let score_providers: Vec<Arc<dyn ScoreProvider>> = vec![
            Arc::new(ApiFootballClient::new(
                http.clone(),
                config.endpoints.api_football.as_str(),
                config.api_football_key.clone(),
            )),
            Arc::new(AllSportsClient::new(
                http.clone(),
                config.endpoints.allsports.as_str(),
                config.allsports_api_key.clone(),
            )),
        ];

        let polls: Arc<dyn PollRepository> = match (&config.supabase_url, &config.supabase_key) {
            (Some(url), Some(key)) => {
                info!("Poll storage: Supabase at {}", url);
                Arc::new(SupabasePollRepository::new(http.clone(), url, key.as_str()))
            }
            _ => {
                warn!("SUPABASE_URL/SUPABASE_SERVICE_KEY not set, polls are kept in memory");
                Arc::new(MemoryPollRepository::new())
            }
        };

        Ok(Self {
            catalog,
            feeds: Arc::new(HttpFeedFetcher::new(http)),
            score_providers,
            polls,
            clock: Arc::new(SystemClock),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub videos: Arc<VideoAggregator>,
    pub channels: Arc<ChannelDirectory>,
    pub roster: Arc<Vec<String>>,
    pub news: Arc<NewsAggregator>,
    pub scores: Arc<ScoreAggregator>,
    pub polls: Arc<PollEngine>,
    pub poll_admin: Arc<PollAdmin>,
    pub quota: Arc<QuotaGovernor>,
    pub admin_gate: AdminGate,
    /// Replace 5xx bodies with a generic message.
    pub hardened: bool,
}

impl AppState {
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let Collaborators {
            catalog,
            feeds,
            score_providers,
            polls,
            clock,
        } = collaborators;

        let quota = Arc::new(QuotaGovernor::new(config.quota, clock.clone()));
        let channels = Arc::new(ChannelDirectory::new(
            catalog,
            quota.clone(),
            config.ttls,
            clock.clone(),
        ));
        let videos = Arc::new(VideoAggregator::new(
            channels.clone(),
            quota.clone(),
            config.channel_handles.clone(),
            config.ttls,
            clock.clone(),
        ));
        let news = Arc::new(NewsAggregator::new(
            feeds,
            config.news_feeds.clone(),
            config.ttls,
            clock.clone(),
        ));
        let scores = Arc::new(ScoreAggregator::new(
            ScoreFailover::new(score_providers),
            config.ttls,
            clock.clone(),
        ));

        Self {
            videos,
            channels,
            roster: Arc::new(config.channel_handles.clone()),
            news,
            scores,
            polls: Arc::new(PollEngine::new(polls.clone(), clock)),
            poll_admin: Arc::new(PollAdmin::new(polls)),
            quota,
            admin_gate: AdminGate::new(config.admin_secret.as_deref()),
            hardened: config.is_hardened(),
        }
    }

    pub fn from_config(config: &Config) -> shared::Result<Self> {
        Ok(Self::new(config, Collaborators::from_config(config)?))
    }
}

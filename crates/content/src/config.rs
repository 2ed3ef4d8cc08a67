use std::time::Duration;

/// Default SEO freshness window.
pub const DEFAULT_SEO_TTL: Duration = Duration::from_secs(300);

/// Default capacity of each manager's notice channel.
pub const DEFAULT_NOTICE_BUFFER: usize = 64;

/// Tunables for the synchronization layer, injected at construction.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// How long a cached SEO read is served before a refetch.
    pub seo_ttl: Duration,
    /// Notices buffered per manager before slow listeners lag.
    pub notice_buffer: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            seo_ttl: DEFAULT_SEO_TTL,
            notice_buffer: DEFAULT_NOTICE_BUFFER,
        }
    }
}

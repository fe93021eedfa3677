//! 社交媒体文本爬虫模块

pub mod twitter;

use crate::types::{ETLError, ETLResult, TextRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// 文本爬虫接口
#[async_trait]
pub trait TextScraper: Send + Sync {
    /// 爬虫名称
    fn name(&self) -> &str;

    /// 抓取账号在 [since, until) 之间发布的文本，按时间从旧到新排列
    async fn fetch_text_records(
        &self,
        account_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ETLResult<Vec<TextRecord>>;
}

/// 每分钟 `requests_per_minute` 次、突发为 1 的限流器
///
/// 相邻两次许可之间至少间隔 `60s / requests_per_minute`。
pub fn pacing_limiter(requests_per_minute: u32) -> ETLResult<Arc<DefaultDirectRateLimiter>> {
    let per_minute = NonZeroU32::new(requests_per_minute)
        .ok_or_else(|| ETLError::Config("requests_per_minute 必须为正整数".to_string()))?;
    let quota = Quota::with_period(Duration::from_secs(60) / per_minute.get())
        .ok_or_else(|| ETLError::Config(format!("requests_per_minute 过大: {}", per_minute)))?
        .allow_burst(NonZeroU32::MIN);

    Ok(Arc::new(RateLimiter::direct(quota)))
}

/// 限流爬虫包装器，每个账号占用一次许可
pub struct RateLimitedScraper<S: TextScraper> {
    scraper: S,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl<S: TextScraper> RateLimitedScraper<S> {
    pub fn new(scraper: S, requests_per_minute: u32) -> ETLResult<Self> {
        Ok(Self {
            scraper,
            rate_limiter: pacing_limiter(requests_per_minute)?,
        })
    }

    async fn wait_for_permit(&self) {
        self.rate_limiter.until_ready().await;
    }
}

#[async_trait]
impl<S: TextScraper> TextScraper for RateLimitedScraper<S> {
    fn name(&self) -> &str {
        self.scraper.name()
    }

    async fn fetch_text_records(
        &self,
        account_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ETLResult<Vec<TextRecord>> {
        self.wait_for_permit().await;
        self.scraper.fetch_text_records(account_id, since, until).await
    }
}

/// 通用 HTTP 客户端配置
pub fn create_http_client() -> ETLResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; FeatureBot/1.0)")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(Into::into)
}

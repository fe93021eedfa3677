//! Twitter API v2 爬虫

use super::{create_http_client, TextScraper};
use crate::types::{ETLError, ETLResult, TextRecord};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use governor::DefaultDirectRateLimiter;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<User>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    meta: Option<TimelineMeta>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct TimelineMeta {
    next_token: Option<String>,
}

fn describe_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.title, e.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 推文转为文本记录，日期取 UTC 日期
fn tweet_to_record(tweet: Tweet) -> ETLResult<TextRecord> {
    let timestamp = DateTime::parse_from_rfc3339(&tweet.created_at)
        .map_err(|e| {
            ETLError::MalformedRecord(format!("created_at 无效 ({}): {}", tweet.created_at, e))
        })?
        .with_timezone(&Utc)
        .naive_utc();

    Ok(TextRecord {
        timestamp,
        date: timestamp.date(),
        content: tweet.text,
    })
}

fn rfc3339_midnight(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

pub struct TwitterScraper {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl TwitterScraper {
    /// 从 `TWITTER_BEARER_TOKEN` 读取令牌
    pub fn new() -> ETLResult<Self> {
        Ok(Self {
            client: create_http_client()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: std::env::var("TWITTER_BEARER_TOKEN").ok(),
            rate_limiter: None,
        })
    }

    pub fn with_bearer_token(bearer_token: String) -> ETLResult<Self> {
        Ok(Self {
            bearer_token: Some(bearer_token),
            ..Self::new()?
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 每个 HTTP 请求（账号查询和每一页时间线）都先取得一次许可
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<DefaultDirectRateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    async fn wait_for_permit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    fn token(&self) -> ETLResult<&str> {
        self.bearer_token
            .as_deref()
            .ok_or_else(|| ETLError::Config("未设置 TWITTER_BEARER_TOKEN".to_string()))
    }

    async fn user_id(&self, username: &str) -> ETLResult<String> {
        let url = format!("{}/2/users/by/username/{}", self.base_url, username);
        let token = self.token()?;
        self.wait_for_permit().await;
        let response: UserResponse = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.data.map(|user| user.id).ok_or_else(|| {
            ETLError::Download(format!(
                "找不到账号 {}: {}",
                username,
                describe_errors(&response.errors)
            ))
        })
    }

    async fn timeline_page(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
        pagination_token: Option<&str>,
    ) -> ETLResult<TimelineResponse> {
        let url = format!("{}/2/users/{}/tweets", self.base_url, user_id);
        let mut query = vec![
            ("max_results", PAGE_SIZE.to_string()),
            ("start_time", rfc3339_midnight(since)),
            ("end_time", rfc3339_midnight(until)),
            ("tweet.fields", "created_at".to_string()),
        ];
        if let Some(token) = pagination_token {
            query.push(("pagination_token", token.to_string()));
        }

        let token = self.token()?;
        self.wait_for_permit().await;
        let response: TimelineResponse = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.data.is_empty() && !response.errors.is_empty() {
            return Err(ETLError::Download(describe_errors(&response.errors)));
        }
        Ok(response)
    }
}

#[async_trait]
impl TextScraper for TwitterScraper {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn fetch_text_records(
        &self,
        account_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ETLResult<Vec<TextRecord>> {
        let user_id = self.user_id(account_id).await?;

        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .timeline_page(&user_id, since, until, next_token.as_deref())
                .await?;
            for tweet in page.data {
                records.push(tweet_to_record(tweet)?);
            }

            next_token = page.meta.and_then(|meta| meta.next_token);
            if next_token.is_none() {
                break;
            }
        }

        // 接口按从新到旧返回
        records.reverse();

        tracing::info!(
            "Fetched {} tweets from @{} between {} and {}",
            records.len(),
            account_id,
            since,
            until
        );
        Ok(records)
    }
}

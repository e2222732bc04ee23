use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client, RequestBuilder};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::app::{Result, SnooError};
use crate::config::RedditConfig;
use crate::domain::Subreddit;
use crate::remote::RemoteService;

const PAGE_LIMIT: &str = "100";
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    children: Vec<Thing<T>>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    display_name: String,
    name: Option<String>,
}

impl From<SubredditData> for Subreddit {
    fn from(data: SubredditData) -> Self {
        Subreddit {
            display_name: data.display_name,
            fullname: data.name,
        }
    }
}

/// Parses one page of `/subreddits/mine/subscriber`.
fn parse_subreddit_listing(body: &[u8]) -> Result<(Vec<Subreddit>, Option<String>)> {
    let listing: Thing<Listing<SubredditData>> = serde_json::from_slice(body)?;
    let subreddits = listing
        .data
        .children
        .into_iter()
        .map(|child| child.data.into())
        .collect();
    Ok((subreddits, listing.data.after))
}

/// Walks listing pages until the cursor runs out or `MAX_PAGES` is hit.
/// The flag is set when the cap cut the listing short.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<(Vec<Subreddit>, bool)>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<Subreddit>, Option<String>)>>,
{
    let mut subreddits = Vec::new();
    let mut after: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let (page, next) = fetch_page(after.take()).await?;
        subreddits.extend(page);

        match next {
            Some(cursor) => after = Some(cursor),
            None => return Ok((subreddits, false)),
        }
    }

    Ok((subreddits, after.is_some()))
}

fn parse_subreddit_about(body: &[u8]) -> Result<Subreddit> {
    let thing: Thing<SubredditData> = serde_json::from_slice(body)?;
    Ok(thing.data.into())
}

pub struct RedditClient {
    client: Client,
    access_token: Option<String>,
    oauth_url: String,
    public_url: String,
}

impl RedditClient {
    pub fn new(config: &RedditConfig) -> Result<Self> {
        // Reddit answers unknown subreddits with a redirect to search.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            oauth_url: config.oauth_url.trim_end_matches('/').to_string(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Each segment is percent-encoded, so a name can't escape its slot.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let (base, suffix) = match self.access_token {
            Some(_) => (&self.oauth_url, ""),
            None => (&self.public_url, ".json"),
        };

        let mut url = Url::parse(base)?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SnooError::Config(format!("Not a base URL: {}", base)))?;
            path.pop_if_empty();
            if let Some((last, rest)) = segments.split_last() {
                path.extend(rest);
                path.push(&format!("{}{}", last, suffix));
            }
        }
        url.query_pairs_mut().append_pair("raw_json", "1");
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(SnooError::Network {
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_subscriber_page(
        &self,
        after: Option<String>,
    ) -> Result<(Vec<Subreddit>, Option<String>)> {
        let mut url = self.endpoint(&["subreddits", "mine", "subscriber"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", PAGE_LIMIT);
            if let Some(ref cursor) = after {
                query.append_pair("after", cursor);
            }
        }

        let body = self.send(self.client.get(url)).await?;
        parse_subreddit_listing(&body)
    }

    async fn post_subscribe(&self, subreddit: &Subreddit, action: &str) -> Result<()> {
        if self.access_token.is_none() {
            return Err(SnooError::Network {
                status: Some(401),
                message: "Not logged in".into(),
            });
        }

        let body = {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            form.append_pair("action", action);
            match subreddit.fullname {
                Some(ref fullname) => form.append_pair("sr", fullname),
                None => form.append_pair("sr_name", &subreddit.display_name),
            };
            form.finish()
        };

        let url = Url::parse(&format!("{}/api/subscribe", self.oauth_url))?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);

        self.send(request).await?;
        tracing::debug!("{} r/{}", action, subreddit.display_name);
        Ok(())
    }
}

#[async_trait]
impl RemoteService for RedditClient {
    async fn is_user_logged_in(&self) -> Result<bool> {
        Ok(self.access_token.is_some())
    }

    async fn user_subreddits(&self) -> Result<Vec<Subreddit>> {
        let (subreddits, truncated) =
            collect_pages(move |after| self.fetch_subscriber_page(after)).await?;

        if truncated {
            warn!(
                "Stopped after {} pages of subscriptions; the rest are not synced",
                MAX_PAGES
            );
        }
        tracing::debug!("Fetched {} subscribed subreddits", subreddits.len());
        Ok(subreddits)
    }

    async fn find_subreddit(&self, name: &str) -> Result<Subreddit> {
        let url = self.endpoint(&["r", name, "about"])?;

        match self.send(self.client.get(url)).await {
            Ok(body) => parse_subreddit_about(&body),
            Err(e) if e.is_not_found() || e.status().is_some_and(|s| (300..400).contains(&s)) => {
                Err(SnooError::NotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn subscribe_to(&self, subreddit: &Subreddit) -> Result<()> {
        self.post_subscribe(subreddit, "sub").await
    }

    async fn unsubscribe_from(&self, subreddit: &Subreddit) -> Result<()> {
        self.post_subscribe(subreddit, "unsub").await
    }
}

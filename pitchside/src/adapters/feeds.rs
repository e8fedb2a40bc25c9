use super::http::ensure_success;
use crate::domain::NewsRecord;
use crate::ports::FeedFetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use shared::config::FeedConfig;
use shared::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

const SUMMARY_CHARS: usize = 280;

// `src` must be a whole attribute name, so `data-src=` never matches.
static IMG_SRC: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).ok()
});

/// Fetches RSS 2.0 or Atom feeds over HTTP.
pub struct HttpFeedFetcher {
    http: Client,
}

impl HttpFeedFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<NewsRecord>> {
        let response = self.http.get(&feed.url).send().await?;
        let response = ensure_success(&feed.name, response).await?;
        let bytes = response.bytes().await?;

        let records = parse_feed(&bytes, &feed.name)?;
        debug!("feed {} yielded {} entries", feed.name, records.len());
        Ok(records)
    }
}

/// Parse a feed payload. Payloads mentioning `<rss` are read as RSS 2.0,
/// anything else as Atom.
pub fn parse_feed(bytes: &[u8], source: &str) -> Result<Vec<NewsRecord>> {
    let text = String::from_utf8_lossy(bytes);
    if text.contains("<rss") {
        parse_rss(bytes, source)
    } else {
        parse_atom(bytes, source)
    }
}

fn parse_rss(bytes: &[u8], source: &str) -> Result<Vec<NewsRecord>> {
    let channel = rss::Channel::read_from(bytes)
        .map_err(|e| Error::UpstreamUnavailable(format!("{}: invalid RSS: {}", source, e)))?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| {
            let body = item.content().or(item.description());
            let image = item
                .enclosure()
                .filter(|e| e.mime_type().is_empty() || e.mime_type().starts_with("image/"))
                .map(|e| e.url().to_string())
                .or_else(|| media_url(item.extensions(), RSS_EXT))
                .or_else(|| body.and_then(first_img_src));

            build_record(
                source,
                item.link(),
                item.guid().map(|g| g.value()),
                item.title(),
                item.pub_date().and_then(parse_date),
                image,
                item.description().or(item.content()),
            )
        })
        .collect())
}

fn parse_atom(bytes: &[u8], source: &str) -> Result<Vec<NewsRecord>> {
    let feed = atom_syndication::Feed::read_from(bytes)
        .map_err(|e| Error::UpstreamUnavailable(format!("{}: invalid feed: {}", source, e)))?;

    Ok(feed
        .entries()
        .iter()
        .filter_map(|entry| {
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or(entry.links().first());
            let enclosure = entry.links().iter().find(|l| {
                l.rel() == "enclosure" && l.mime_type().is_none_or(|m| m.starts_with("image/"))
            });
            let content = entry.content().and_then(|c| c.value());
            let summary = entry.summary().map(|s| s.as_str());

            let image = enclosure
                .map(|l| l.href().to_string())
                .or_else(|| media_url(entry.extensions(), ATOM_EXT))
                .or_else(|| content.or(summary).and_then(first_img_src));

            build_record(
                source,
                link.map(|l| l.href()),
                Some(entry.id()),
                Some(entry.title().as_str()),
                Some(entry.published().copied().unwrap_or(*entry.updated()).to_utc()),
                image,
                summary.or(content),
            )
        })
        .collect())
}

fn build_record(
    source: &str,
    link: Option<&str>,
    guid: Option<&str>,
    title: Option<&str>,
    published_at: Option<DateTime<Utc>>,
    image: Option<String>,
    body: Option<&str>,
) -> Option<NewsRecord> {
    let url = link
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(normalize_url)
        .unwrap_or_default();
    let title = title.map(|t| decode_entities(t.trim())).unwrap_or_default();
    if url.is_empty() && title.is_empty() {
        return None;
    }

    let key = NewsRecord::dedupe_key(&url, source, guid, &title);
    Some(NewsRecord {
        id: NewsRecord::id_for(&key),
        url,
        title,
        image: image.map(|i| normalize_url(i.trim())),
        source: source.to_string(),
        published_at,
        summary: body.and_then(summarize),
    })
}

fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.to_utc())
}

// === Media RSS ===

/// Lookup helpers for the two crates' extension types, which share a shape
/// but not a type.
struct ExtShape<E> {
    value: fn(&E) -> Option<&str>,
    attrs: fn(&E) -> &BTreeMap<String, String>,
    children: fn(&E) -> &BTreeMap<String, Vec<E>>,
}

const RSS_EXT: ExtShape<rss::extension::Extension> = ExtShape {
    value: rss::extension::Extension::value,
    attrs: rss::extension::Extension::attrs,
    children: rss::extension::Extension::children,
};

const ATOM_EXT: ExtShape<atom_syndication::extension::Extension> = ExtShape {
    value: atom_syndication::extension::Extension::value,
    attrs: atom_syndication::extension::Extension::attrs,
    children: atom_syndication::extension::Extension::children,
};

/// First image URL from `media:content`, `media:thumbnail`, or either of
/// those nested under `media:group`.
fn media_url<E>(
    extensions: &BTreeMap<String, BTreeMap<String, Vec<E>>>,
    shape: ExtShape<E>,
) -> Option<String> {
    let media = extensions.get("media")?;
    let direct = find_media(media, &shape);
    direct.or_else(|| {
        media
            .get("group")?
            .iter()
            .find_map(|group| find_media((shape.children)(group), &shape))
    })
}

fn find_media<E>(elements: &BTreeMap<String, Vec<E>>, shape: &ExtShape<E>) -> Option<String> {
    let content = elements.get("content").into_iter().flatten().find(|e| {
        let attrs = (shape.attrs)(e);
        let medium = attrs.get("medium").map(String::as_str);
        let mime = attrs.get("type").map(String::as_str);
        medium == Some("image")
            || mime.is_some_and(|m| m.starts_with("image/"))
            || (medium.is_none() && mime.is_none())
    });
    let thumbnail = || elements.get("thumbnail").into_iter().flatten().next();

    content
        .or_else(thumbnail)
        .and_then(|e| {
            (shape.attrs)(e)
                .get("url")
                .cloned()
                .or_else(|| (shape.value)(e).map(str::to_string))
        })
        .filter(|u| !u.trim().is_empty())
}

// === HTML helpers ===

/// `src` of the first `<img>` tag in an HTML fragment.
fn first_img_src(html: &str) -> Option<String> {
    let caps = IMG_SRC.as_ref()?.captures(html)?;
    let src = match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(quoted), _, _) | (_, Some(quoted), _) => quoted.as_str(),
        // unquoted value of a self-closing tag picks up the slash
        (_, _, Some(bare)) => bare.as_str().strip_suffix('/').unwrap_or(bare.as_str()),
        _ => return None,
    };
    let src = src.trim();
    (!src.is_empty()).then(|| decode_entities(src))
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Plain-text summary: tags stripped, whitespace collapsed, at most 280 chars.
fn summarize(html: &str) -> Option<String> {
    // Feeds often escape their HTML, so decode before stripping.
    let plain = strip_tags(&decode_entities(html));
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    let truncated: String = collapsed.chars().take(SUMMARY_CHARS).collect();
    Some(truncated.trim_end().to_string())
}

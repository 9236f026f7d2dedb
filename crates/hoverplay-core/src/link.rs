//! Video link classification.
//!
//! Turns an anchor into a [`LinkInfo`] when it points at a video on one of
//! the recognised hosts, and picks the anchor out of an event path.

use std::sync::LazyLock;

use hoverplay_protocols::{NodeId, Page};
use regex::Regex;
use url::Url;

/// The video-hosting site; hover rules differ there.
pub const VIDEO_HOST: &str = "www.youtube.com";

/// `href` fragments identifying a video link anywhere in a page.
pub const LINK_FRAGMENTS: [&str; 2] = ["//www.youtube.com/", "//youtu.be/"];

const SHORT_HOST: &str = "youtu.be";

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s?)?$").expect("invalid time regex")
});

/// A classified video link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Video id, or the indirect id when `indirect` is set.
    pub video_id: String,
    /// The id must be resolved through the relay before use.
    pub indirect: bool,
    pub anchor: NodeId,
    pub href: String,
    pub start_seconds: u64,
}

/// The id-bearing part of a video URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub video_id: String,
    pub indirect: bool,
    pub start_seconds: u64,
}

/// Classify an absolute URL. `None` when it is not a video link.
pub fn classify_url(href: &str) -> Option<VideoRef> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?;
    let is_site = host == VIDEO_HOST || host == "youtube.com";
    let is_short = host == SHORT_HOST;
    if !is_site && !is_short {
        return None;
    }

    let path = url.path();
    let mut indirect = false;
    let (id, time) = if is_short {
        (path.split('/').nth(1).map(str::to_string), query_param(&url, "t"))
    } else if path.starts_with("/embed/") {
        (path.split('/').nth(2).map(str::to_string), query_param(&url, "t"))
    } else if path.starts_with("/watch") {
        (query_param(&url, "v"), query_param(&url, "t"))
    } else if path.starts_with("/attribution_link") {
        let nested = query_param(&url, "u")?;
        let query = nested.split('?').nth(1).unwrap_or_default();
        let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let get = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
        (get("v"), get("t"))
    } else if path.starts_with("/shared") {
        indirect = true;
        (query_param(&url, "ci"), query_param(&url, "t"))
    } else {
        return None;
    };

    let video_id = id.filter(|id| !id.is_empty())?;
    Some(VideoRef {
        video_id,
        indirect,
        start_seconds: time.as_deref().map(parse_start_time).unwrap_or(0),
    })
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Parse a start time: `#h#m#s` with every part optional, or bare seconds.
/// Anything else is 0.
pub fn parse_start_time(spec: &str) -> u64 {
    let Some(caps) = TIME_REGEX.captures(spec.trim()) else {
        return 0;
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    part(1)
        .saturating_mul(3600)
        .saturating_add(part(2).saturating_mul(60))
        .saturating_add(part(3))
}

/// Classify an anchor node of the page.
pub fn classify_anchor(page: &dyn Page, anchor: NodeId) -> Option<LinkInfo> {
    let href = page.href(anchor)?;
    let video = classify_url(&href)?;
    Some(LinkInfo {
        video_id: video.video_id,
        indirect: video.indirect,
        anchor,
        href,
        start_seconds: video.start_seconds,
    })
}

/// Pick the anchor for an event. On the video-hosting site only
/// thumbnail-shaped structures qualify.
pub fn find_anchor(
    page: &dyn Page,
    target: NodeId,
    path: &[NodeId],
    on_video_host: bool,
) -> Option<NodeId> {
    let is = |node: &NodeId, tag: &str| page.local_name(*node).as_deref() == Some(tag);
    let first_anchor = || path.iter().find(|n| is(n, "a")).copied();

    if !on_video_host {
        return first_anchor();
    }

    let qualifies = is(&target, "a")
        || is(&target, "img")
        || path.iter().any(|n| {
            is(n, "ytd-moving-thumbnail-renderer")
                || is(n, "ytd-thumbnail-overlay-toggle-button-renderer")
        })
        || !path.iter().any(|n| is(n, "ytd-thumbnail"));
    if qualifies { first_anchor() } else { None }
}

/// The embed frame URL for a video. On the video-hosting site the frame
/// loads a wrapper page carrying the embed URL in its fragment.
pub fn embed_url(video_id: &str, start_seconds: u64, on_video_host: bool) -> String {
    let embed = format!(
        "https://www.youtube.com/embed/{}?start={}&fs=1&autoplay=1&enablejsapi=1",
        video_id, start_seconds
    );
    if on_video_host {
        format!("https://blank.org/#{}", embed)
    } else {
        embed
    }
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;

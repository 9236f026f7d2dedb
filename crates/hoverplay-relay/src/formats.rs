//! Stream format normalisation.
//!
//! Turns the raw format list the video host publishes into ordered
//! [`StreamCandidate`]s the native surface can append as `<source>`s.

use std::sync::LazyLock;

use hoverplay_protocols::{StreamCandidate, StreamFormat};
use regex::Regex;
use tracing::warn;

use crate::signature::SignatureDecoder;

static CODEC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"codecs="([^."]+)"#).expect("invalid codec regex"));

/// Normalise raw formats: highest resolution first (width, then height),
/// ciphered URLs rebuilt with their decoded signature. Formats without any
/// usable URL are dropped.
pub fn normalize_formats(
    mut formats: Vec<StreamFormat>,
    decoder: &dyn SignatureDecoder,
) -> Vec<StreamCandidate> {
    formats.sort_by(|a, b| b.width.cmp(&a.width).then(b.height.cmp(&a.height)));
    formats
        .iter()
        .filter_map(|format| {
            let src = match stream_url(format, decoder) {
                Some(src) => src,
                None => {
                    warn!("Dropping stream format without url: {}", format.mime_type);
                    return None;
                }
            };
            Some(StreamCandidate {
                src,
                title: stream_title(format),
            })
        })
        .collect()
}

fn stream_url(format: &StreamFormat, decoder: &dyn SignatureDecoder) -> Option<String> {
    if let Some(url) = format.url.as_ref().filter(|u| !u.is_empty()) {
        return Some(url.clone());
    }
    let cipher = format.cipher.as_deref()?;

    let mut base = None;
    let mut signature = None;
    let mut param = None;
    for (key, value) in url::form_urlencoded::parse(cipher.as_bytes()) {
        match key.as_ref() {
            "url" => base = Some(value.into_owned()),
            "s" => signature = Some(value.into_owned()),
            "sp" => param = Some(value.into_owned()),
            _ => {}
        }
    }

    let mut url = base.filter(|u| !u.is_empty())?;
    if let Some(s) = signature.filter(|s| !s.is_empty()) {
        let param = param.filter(|p| !p.is_empty());
        url.push('&');
        url.push_str(param.as_deref().unwrap_or("sig"));
        url.push('=');
        url.push_str(&decoder.decode(&s));
    }
    Some(url)
}

/// `quality, qualityLabel, type[:codec]`, skipping empty parts and a label
/// equal to the quality.
fn stream_title(format: &StreamFormat) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if !format.quality.is_empty() {
        parts.push(format.quality.clone());
    }
    if let Some(label) = &format.quality_label {
        if !label.is_empty() && *label != format.quality {
            parts.push(label.clone());
        }
    }

    let media_type = format
        .mime_type
        .split(['/', ';'])
        .nth(1)
        .map(str::trim)
        .unwrap_or_default();
    let codec = CODEC_REGEX
        .captures(&format.mime_type)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());
    let kind = match codec {
        Some(codec) => format!("{}:{}", media_type, codec),
        None => media_type.to_string(),
    };
    if !kind.is_empty() {
        parts.push(kind);
    }
    parts.join(", ")
}

#[cfg(test)]
#[path = "formats_tests.rs"]
mod tests;

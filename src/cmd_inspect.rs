//! Inspection subcommands: URL classification, placement, signatures.

use std::fs;
use std::path::Path;

use anyhow::Context;
use hoverplay_config::{PlacementMode, PreferenceLoader, Preferences};
use hoverplay_core::geometry::{Size, anchored_placement, centered_placement};
use hoverplay_core::{classify_url, embed_url};
use hoverplay_protocols::{Rect, Viewport};
use hoverplay_relay::{SignatureAlgorithm, SignatureDecoder};
use serde_json::{Value, json};

/// One line per URL: the classification and the embed URL it would load.
pub(crate) fn classify(urls: &[String], on_video_host: bool) -> Vec<String> {
    urls.iter()
        .map(|url| match classify_url(url) {
            Some(video) if video.indirect => format!(
                "{}\tindirect id={} start={}s",
                url, video.video_id, video.start_seconds
            ),
            Some(video) => format!(
                "{}\tvideo id={} start={}s\t{}",
                url,
                video.video_id,
                video.start_seconds,
                embed_url(&video.video_id, video.start_seconds, on_video_host)
            ),
            None => format!("{}\tnot a video link", url),
        })
        .collect()
}

pub(crate) fn load_preferences(path: Option<&Path>) -> anyhow::Result<Preferences> {
    match path {
        Some(path) => PreferenceLoader::load(path)
            .with_context(|| format!("cannot load preferences from {}", path.display())),
        None => Ok(Preferences::default()),
    }
}

/// Placement of an overlay for a link rectangle, in the mode the
/// preferences select.
pub(crate) fn place(rect: Rect, viewport: Viewport, prefs: &Preferences) -> Value {
    if prefs.mode == PlacementMode::Centered {
        let centered = centered_placement(prefs);
        let size = Size::for_width(prefs.width);
        return json!({
            "mode": "center",
            "left": format!("calc(50% - {}px)", centered.left_offset),
            "top": format!("calc(50% - {}px)", centered.top_offset),
            "width": size.width,
            "height": size.height,
        });
    }

    let placement = anchored_placement(rect, &viewport, prefs);
    json!({
        "mode": "anchor",
        "left": placement.left,
        "top": placement.top,
        "width": placement.width,
        "height": placement.height,
        "scroll": placement.scroll,
    })
}

pub(crate) fn decode_signature(signature: &str, algorithm: Option<&Path>) -> anyhow::Result<String> {
    let algorithm = match algorithm {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            serde_json::from_str::<SignatureAlgorithm>(&content)
                .with_context(|| format!("invalid signature algorithm in {}", path.display()))?
        }
        None => SignatureAlgorithm::v1(),
    };
    tracing::debug!("Decoding with signature algorithm v{}", algorithm.version());
    Ok(algorithm.decode(signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classify_lines() {
        let lines = classify(
            &[
                "https://youtu.be/abc?t=90".to_string(),
                "https://www.youtube.com/shared?ci=xyz".to_string(),
                "https://example.com/".to_string(),
            ],
            false,
        );
        assert_eq!(
            lines[0],
            "https://youtu.be/abc?t=90\tvideo id=abc start=90s\t\
             https://www.youtube.com/embed/abc?start=90&fs=1&autoplay=1&enablejsapi=1"
        );
        assert_eq!(lines[1], "https://www.youtube.com/shared?ci=xyz\tindirect id=xyz start=0s");
        assert_eq!(lines[2], "https://example.com/\tnot a video link");
    }

    #[test]
    fn test_place_anchor_below_link() {
        let placed = place(
            Rect::new(100.0, 100.0, 200.0, 20.0),
            Viewport::default(),
            &Preferences::default(),
        );
        assert_eq!(placed["mode"], "anchor");
        assert_eq!(placed["left"], 100.0);
        assert_eq!(placed["top"], 120.0);
        assert_eq!(placed["width"], 500.0);
        assert!(placed["scroll"].is_null());
    }

    #[test]
    fn test_place_centered() {
        let prefs = PreferenceLoader::load_str(r#"{"mode": 1, "width": 640}"#).unwrap();
        let placed = place(Rect::default(), Viewport::default(), &prefs);
        assert_eq!(placed["mode"], "center");
        assert_eq!(placed["left"], "calc(50% - 320px)");
        assert_eq!(placed["height"], 360.0);
    }

    #[test]
    fn test_decode_signature_builtin_and_file() {
        assert_eq!(decode_signature("abcdef", None).unwrap(), "deacbf");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"version": 2, "steps": [{{"op": "reverse"}}, {{"op": "splice", "count": 1}}]}}"#)
            .unwrap();
        assert_eq!(decode_signature("abcdef", Some(file.path())).unwrap(), "edcba");
    }

    #[test]
    fn test_missing_preferences_file() {
        assert!(load_preferences(Some(Path::new("/nonexistent/prefs.json"))).is_err());
        assert_eq!(load_preferences(None).unwrap().width, Preferences::default().width);
    }
}

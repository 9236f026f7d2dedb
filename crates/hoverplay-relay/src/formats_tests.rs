use super::*;
use crate::signature::SignatureAlgorithm;

fn format(width: u32, height: u32, url: &str) -> StreamFormat {
    StreamFormat {
        url: Some(url.to_string()),
        mime_type: r#"video/mp4; codecs="avc1.42001E, mp4a.40.2""#.to_string(),
        quality: "medium".to_string(),
        quality_label: Some("360p".to_string()),
        width,
        height,
        ..Default::default()
    }
}

#[test]
fn test_sorted_by_width_then_height() {
    let formats = vec![
        format(640, 360, "https://cdn/a"),
        format(1280, 720, "https://cdn/b"),
        format(640, 480, "https://cdn/c"),
    ];
    let candidates = normalize_formats(formats, &SignatureAlgorithm::v1());
    let srcs: Vec<_> = candidates.iter().map(|c| c.src.as_str()).collect();
    assert_eq!(srcs, vec!["https://cdn/b", "https://cdn/c", "https://cdn/a"]);
}

#[test]
fn test_title_parts() {
    let candidates = normalize_formats(vec![format(640, 360, "u")], &SignatureAlgorithm::v1());
    assert_eq!(candidates[0].title, "medium, 360p, mp4:avc1");
}

#[test]
fn test_title_skips_label_equal_to_quality() {
    let mut f = format(640, 360, "u");
    f.quality = "hd720".to_string();
    f.quality_label = Some("hd720".to_string());
    f.mime_type = "video/webm".to_string();
    let candidates = normalize_formats(vec![f], &SignatureAlgorithm::v1());
    assert_eq!(candidates[0].title, "hd720, webm");
}

#[test]
fn test_title_quoted_codec_without_dot() {
    let mut f = format(640, 360, "u");
    f.quality_label = None;
    f.mime_type = r#"video/webm; codecs="vp9""#.to_string();
    let candidates = normalize_formats(vec![f], &SignatureAlgorithm::v1());
    assert_eq!(candidates[0].title, "medium, webm:vp9");
}

#[test]
fn test_ciphered_url_rebuilt() {
    let f = StreamFormat {
        cipher: Some("s=abcdef&sp=signature&url=https%3A%2F%2Fcdn%2Fv%3Fid%3D1".to_string()),
        mime_type: "video/mp4".to_string(),
        quality: "small".to_string(),
        width: 320,
        height: 180,
        ..Default::default()
    };
    let candidates = normalize_formats(vec![f], &SignatureAlgorithm::v1());
    assert_eq!(candidates[0].src, "https://cdn/v?id=1&signature=deacbf");
}

#[test]
fn test_ciphered_url_default_param() {
    let f = StreamFormat {
        cipher: Some("url=https%3A%2F%2Fcdn%2Fv&s=abcdef".to_string()),
        ..Default::default()
    };
    let candidates = normalize_formats(vec![f], &SignatureAlgorithm::v1());
    assert_eq!(candidates[0].src, "https://cdn/v&sig=deacbf");
}

#[test]
fn test_cipher_without_signature_keeps_url() {
    let f = StreamFormat {
        cipher: Some("url=https%3A%2F%2Fcdn%2Fv".to_string()),
        ..Default::default()
    };
    let candidates = normalize_formats(vec![f], &SignatureAlgorithm::v1());
    assert_eq!(candidates[0].src, "https://cdn/v");
}

#[test]
fn test_format_without_url_dropped() {
    let f = StreamFormat {
        cipher: Some("s=abc".to_string()),
        ..Default::default()
    };
    let candidates = normalize_formats(vec![f, format(1, 1, "https://cdn/ok")], &SignatureAlgorithm::v1());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].src, "https://cdn/ok");
}

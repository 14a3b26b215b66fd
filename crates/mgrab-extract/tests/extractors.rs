//! Strategy tests against mocked origins.

use std::sync::Arc;

use mgrab_extract::strategies::{ThreadsExtractor, XiaohongshuExtractor};
use mgrab_extract::{ExtractError, Extractor, ExtractorConfig, MediaResolver, SoundCloudClient};
use mgrab_models::{MediaKind, Platform};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ExtractorConfig {
    ExtractorConfig {
        tikwm_base_url: server.uri(),
        threads_api_url: format!("{}/v2/media", server.uri()),
        soundcloud_api_url: server.uri(),
        soundcloud_client_id: "test-client".to_string(),
        ..ExtractorConfig::default()
    }
}

fn resolver_for(config: &ExtractorConfig) -> MediaResolver {
    let soundcloud = Arc::new(SoundCloudClient::from_config(config).unwrap());
    MediaResolver::with_defaults(config, soundcloud).unwrap()
}

#[tokio::test]
async fn tiktok_resolves_three_downloads() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_partial_json(json!({
            "url": "https://tiktok.com/@user/video/123",
            "count": 12,
            "cursor": 0,
            "web": 1,
            "hd": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "success",
            "data": {
                "title": "clip",
                "cover": "https://cdn.example/cover.jpg",
                "play": "/video/media/play/1.mp4",
                "wmplay": "/video/media/wmplay/1.mp4",
                "hdplay": "/video/media/hdplay/1.mp4",
                "music": "/video/music/1.mp3",
                "play_count": 100,
                "digg_count": 5,
                "author": { "unique_id": "user", "nickname": "User", "avatar": "https://a" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/video/media/hdplay/1.mp4"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://v16.example.com/hd.mp4"),
        )
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/video/media/wmplay/1.mp4"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/cdn/wm.mp4"))
        .mount(&server)
        .await;

    let result = resolver_for(&config_for(&server))
        .resolve("tiktok.com/@user/video/123")
        .await
        .unwrap();

    assert_eq!(result.platform(), Platform::Tiktok);
    let kinds: Vec<_> = result.downloads().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![MediaKind::VideoHd, MediaKind::VideoWatermark, MediaKind::Audio]
    );

    let downloads = result.downloads();
    assert_eq!(downloads[0].url, "https://v16.example.com/hd.mp4");
    assert_eq!(downloads[0].filename, "tiktok_user_hd.mp4");
    // Relative Location is joined to the request URL.
    assert_eq!(downloads[1].url, format!("{}/cdn/wm.mp4", server.uri()));
    assert_eq!(downloads[1].filename, "tiktok_user_watermark.mp4");
    // No redirect: original URL kept.
    assert_eq!(downloads[2].url, format!("{}/video/music/1.mp3", server.uri()));
    assert_eq!(downloads[2].filename, "tiktok_user_audio.mp3");

    let meta = result.metadata().unwrap();
    assert_eq!(meta.title.as_deref(), Some("clip"));
    assert_eq!(meta.stats.as_ref().unwrap().plays, Some(100));
}

#[tokio::test]
async fn tiktok_exhausts_chain_when_tikwm_has_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": -1, "msg": "Url parsing is failed!" })),
        )
        .mount(&server)
        .await;

    let err = resolver_for(&config_for(&server))
        .resolve("https://www.tiktok.com/@user/video/1")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::ExtractionFailed(_)));
    assert_eq!(
        err.to_string(),
        "Failed to extract from TikTok: all strategies exhausted"
    );
}

#[tokio::test]
async fn tiktok_empty_paths_fall_through_the_chain() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "play": "", "hdplay": "", "wmplay": "", "music": "" }
        })))
        .mount(&server)
        .await;

    let err = resolver_for(&config_for(&server))
        .resolve("https://tiktok.com/@u/video/1")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to extract from TikTok: all strategies exhausted"
    );
}

#[tokio::test]
async fn tiktok_skips_missing_watermark_and_audio() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "play": "/video/media/play/2.mp4",
                "hdplay": "",
                "wmplay": "",
                "author": { "unique_id": "solo" }
            }
        })))
        .mount(&server)
        .await;

    let result = resolver_for(&config_for(&server))
        .resolve("https://tiktok.com/@solo/video/2")
        .await
        .unwrap();

    let downloads = result.downloads();
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].kind, MediaKind::VideoHd);
    assert_eq!(downloads[0].url, format!("{}/video/media/play/2.mp4", server.uri()));
    assert!(downloads.iter().all(|d| d.url != server.uri()));
}

#[tokio::test]
async fn threads_builds_entries_from_api() {
    let server = MockServer::start().await;
    let post = "https://www.threads.net/@someone/post/C1";

    Mock::given(method("GET"))
        .and(path("/v2/media"))
        .and(query_param("url", post))
        .and(header("Origin", "https://sssthreads.pro"))
        .and(header("Referer", "https://sssthreads.pro/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_urls": [{ "download_url": "https://scontent.example/v.mp4" }],
            "image_urls": ["https://scontent.example/i.jpg"]
        })))
        .mount(&server)
        .await;

    let extractor = ThreadsExtractor::new(&config_for(&server)).unwrap();
    let result = extractor.extract(post).await.unwrap();

    let downloads = result.downloads();
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0].kind, MediaKind::Video);
    assert!(downloads[0].filename.starts_with("threads_video_"));
    assert!(downloads[0].filename.ends_with("_1.mp4"));
    assert_eq!(downloads[1].kind, MediaKind::Image);
    assert!(downloads[1].filename.ends_with("_1.jpg"));
}

#[tokio::test]
async fn threads_without_media_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "video_urls": [], "image_urls": [] })))
        .mount(&server)
        .await;

    let extractor = ThreadsExtractor::new(&config_for(&server)).unwrap();
    let err = extractor
        .extract("https://www.threads.net/@a/post/1")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::ExtractionFailed(_)));
}

#[tokio::test]
async fn soundcloud_resolves_track() {
    let server = MockServer::start().await;
    let page = "https://soundcloud.com/artist/night-drive";

    Mock::given(method("GET"))
        .and(path("/resolve"))
        .and(query_param("url", page))
        .and(query_param("client_id", "test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 99,
            "kind": "track",
            "title": "Night Drive",
            "duration": 125400,
            "genre": "Synthwave",
            "user": { "username": "Artist", "permalink": "artist" }
        })))
        .mount(&server)
        .await;

    let result = resolver_for(&config_for(&server)).resolve(page).await.unwrap();

    assert_eq!(result.platform(), Platform::Soundcloud);
    let entry = &result.downloads()[0];
    assert_eq!(entry.kind, MediaKind::Audio);
    assert_eq!(entry.url, page);
    assert_eq!(entry.filename, "night_drive_99.mp3");
    assert_eq!(result.metadata().unwrap().duration.as_deref(), Some("2:05"));
}

#[tokio::test]
async fn soundcloud_open_stream_follows_progressive_transcoding() {
    let server = MockServer::start().await;
    let page = "https://soundcloud.com/artist/night-drive";

    Mock::given(method("GET"))
        .and(path("/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "kind": "track",
            "media": { "transcodings": [
                { "url": format!("{}/media/hls", server.uri()), "format": { "protocol": "hls" } },
                { "url": format!("{}/media/progressive", server.uri()), "format": { "protocol": "progressive" } }
            ]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/media/progressive"))
        .and(query_param("client_id", "test-client"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": format!("{}/signed/track.mp3", server.uri()) })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/signed/track.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
        .mount(&server)
        .await;

    let client = SoundCloudClient::from_config(&config_for(&server)).unwrap();
    let response = client.open_stream(page).await.unwrap();
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"ID3audio");
}

#[tokio::test]
async fn soundcloud_resolve_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resolve"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SoundCloudClient::from_config(&config_for(&server)).unwrap();
    let err = client
        .open_stream("https://soundcloud.com/a/missing")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn xiaohongshu_page_is_parsed() {
    let server = MockServer::start().await;
    let html = r#"<html><body><script>window.__INITIAL_STATE__={"note":{"currentNoteId":"6501","noteDetailMap":{"6501":{"note":{"title":"t","imageList":[{"urlDefault":"http://sns-img.example/1"}]}}}}}</script></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/explore/6501"))
        .and(header("Cookie", "webId=auto;"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let extractor = XiaohongshuExtractor::new(&ExtractorConfig::default()).unwrap();
    let result = extractor
        .extract(&format!("{}/explore/6501", server.uri()))
        .await
        .unwrap();

    let entry = &result.downloads()[0];
    assert_eq!(entry.kind, MediaKind::Image);
    assert_eq!(entry.url, "https://sns-img.example/1");
    assert_eq!(entry.filename, "xiaohongshu_image_6501_1.jpg");
    assert!(entry.headers.is_some());
}

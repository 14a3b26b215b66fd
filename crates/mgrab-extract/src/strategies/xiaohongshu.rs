//! Xiaohongshu note extraction from the embedded page state.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use mgrab_models::{Author, DownloadEntry, ExtractionResult, MediaKind, MediaMetadata, Platform};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};

use super::sanitize::{extract_object_literal, sanitize_state_json};
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::http::{build_client, DESKTOP_UA};
use crate::traits::Extractor;

/// Referer the image/video CDN expects.
pub const REFERER: &str = "https://www.xiaohongshu.com/";

/// Cookie the page and CDN expect.
pub const COOKIE: &str = "webId=auto;";

const STATE_MARKER: &str = "window.__INITIAL_STATE__=";

/// Browser headers sent with the page request and attached to every entry.
pub fn request_headers() -> BTreeMap<String, String> {
    [
        ("User-Agent", DESKTOP_UA),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Referer", REFERER),
        ("Cookie", COOKIE),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

// =============================================================================
// Page state schema
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InitialState {
    note: Option<NoteState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NoteState {
    current_note_id: Option<String>,
    note_detail_map: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteDetail {
    note: Option<Note>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Note {
    title: Option<String>,
    desc: Option<String>,
    video: Option<Video>,
    image_list: Option<Vec<Image>>,
    user: Option<NoteUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Video {
    media: Option<VideoMedia>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoMedia {
    stream: Option<VideoStreams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoStreams {
    h264: Option<Vec<StreamItem>>,
    h265: Option<Vec<StreamItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StreamItem {
    master_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Image {
    url_default: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NoteUser {
    nickname: Option<String>,
    user_id: Option<String>,
    avatar: Option<String>,
}

impl Note {
    /// First non-empty master URL, preferring h264 over h265.
    fn video_url(&self) -> Option<&str> {
        let streams = self.video.as_ref()?.media.as_ref()?.stream.as_ref()?;
        [streams.h264.as_deref(), streams.h265.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|items| items.first())
            .filter_map(|item| item.master_url.as_deref())
            .find(|url| !url.is_empty())
    }
}

// =============================================================================
// Extractor
// =============================================================================

pub struct XiaohongshuExtractor {
    http: Client,
}

impl XiaohongshuExtractor {
    pub fn new(config: &ExtractorConfig) -> ExtractResult<Self> {
        Ok(Self {
            http: build_client(config.request_timeout)?,
        })
    }
}

#[async_trait]
impl Extractor for XiaohongshuExtractor {
    fn platform(&self) -> Platform {
        Platform::Xiaohongshu
    }

    async fn extract(&self, url: &str) -> ExtractResult<ExtractionResult> {
        let headers = request_headers();
        let mut request = self.http.get(url);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExtractError::failed(Platform::Xiaohongshu, e))?;
        if !response.status().is_success() {
            return Err(ExtractError::failed(
                Platform::Xiaohongshu,
                format!("page returned HTTP {}", response.status().as_u16()),
            ));
        }
        let html = response
            .text()
            .await
            .map_err(|e| ExtractError::failed(Platform::Xiaohongshu, e))?;

        let result = parse_note_page(&html, &headers)?;
        info!(downloads = result.downloads().len(), "Xiaohongshu note extracted");
        Ok(result)
    }
}

/// Text of the last `<script>` carrying the state marker.
fn find_state_script(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").ok()?;
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .filter(|text| text.contains(STATE_MARKER))
        .last()
}

fn https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Turn a note page into downloads.
fn parse_note_page(
    html: &str,
    headers: &BTreeMap<String, String>,
) -> ExtractResult<ExtractionResult> {
    let fail = |reason: &str| ExtractError::failed(Platform::Xiaohongshu, reason);

    let script = find_state_script(html).ok_or_else(|| fail("page state not found"))?;
    let literal = extract_object_literal(&script, STATE_MARKER)
        .ok_or_else(|| fail("page state is malformed"))?;
    let cleaned = sanitize_state_json(literal);

    let state: InitialState = serde_json::from_str(&cleaned).map_err(|e| {
        debug!(error = %e, "Xiaohongshu state did not parse");
        fail("page state could not be parsed")
    })?;

    let note_state = state.note.ok_or_else(|| fail("note data not found"))?;
    let id = note_state
        .current_note_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| fail("note data not found"))?;
    let detail = note_state
        .note_detail_map
        .and_then(|mut map| map.remove(&id))
        .ok_or_else(|| fail("note data not found"))?;
    let note = serde_json::from_value::<NoteDetail>(detail)
        .map_err(|_| fail("note data could not be parsed"))?
        .note
        .ok_or_else(|| fail("note data not found"))?;

    let mut downloads = Vec::new();
    if let Some(video_url) = note.video_url() {
        downloads.push(
            DownloadEntry::new(
                MediaKind::Video,
                https(video_url),
                &format!("xiaohongshu_video_{}.mp4", id),
            )
            .with_headers(headers.clone()),
        );
    } else {
        for (index, image) in note.image_list.iter().flatten().enumerate() {
            let Some(url) = image.url_default.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            downloads.push(
                DownloadEntry::new(
                    MediaKind::Image,
                    https(url),
                    &format!("xiaohongshu_image_{}_{}.jpg", id, index + 1),
                )
                .with_headers(headers.clone()),
            );
        }
    }

    if downloads.is_empty() {
        return Err(fail("no downloadable media"));
    }

    let user = note.user.unwrap_or_default();
    let metadata = MediaMetadata {
        title: note.title.filter(|t| !t.is_empty()),
        description: note.desc.filter(|d| !d.is_empty()),
        author: Some(Author {
            name: user.nickname,
            username: user.user_id,
            avatar: user.avatar,
            ..Default::default()
        }),
        ..Default::default()
    };

    Ok(ExtractionResult::new(Platform::Xiaohongshu, downloads)?.with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(state: &str) -> String {
        format!(
            "<html><head><script>var a = 1;</script></head><body>\
             <script>window.__INITIAL_STATE__={}</script></body></html>",
            state
        )
    }

    #[test]
    fn test_video_note() {
        let html = page(
            r#"{"note":{"currentNoteId":"n1","noteDetailMap":{"n1":{"note":{"title":"Hi","video":{"media":{"stream":{"h264":[{"masterUrl":"http://sns-video.example/v.mp4"}],"h265":[]}}},"user":{"nickname":"Ann","userId":"u9"}}}}},"extra":undefined}"#,
        );
        let result = parse_note_page(&html, &request_headers()).unwrap();

        assert_eq!(result.platform(), Platform::Xiaohongshu);
        let entries = result.downloads();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, MediaKind::Video);
        assert_eq!(entries[0].url, "https://sns-video.example/v.mp4");
        assert_eq!(entries[0].filename, "xiaohongshu_video_n1.mp4");
        let headers = entries[0].headers.as_ref().unwrap();
        assert_eq!(headers["Cookie"], "webId=auto;");
        assert_eq!(headers["Referer"], REFERER);

        let meta = result.metadata().unwrap();
        assert_eq!(meta.title.as_deref(), Some("Hi"));
        assert_eq!(meta.author.as_ref().unwrap().name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_h265_used_when_h264_empty() {
        let html = page(
            r#"{"note":{"currentNoteId":"n2","noteDetailMap":{"n2":{"note":{"video":{"media":{"stream":{"h264":[{"masterUrl":""}],"h265":[{"masterUrl":"https://cdn.example/h265.mp4"}]}}}}}}}}"#,
        );
        let result = parse_note_page(&html, &request_headers()).unwrap();
        assert_eq!(result.downloads()[0].url, "https://cdn.example/h265.mp4");
    }

    #[test]
    fn test_image_note_keeps_list_positions() {
        let html = page(
            r#"{"note":{"currentNoteId":"abc","noteDetailMap":{"abc":{"note":{"imageList":[{"urlDefault":"http://img.example/1.jpg"},{"urlDefault":""},{"urlDefault":"https://img.example/3.jpg"}]}}}}}"#,
        );
        let result = parse_note_page(&html, &request_headers()).unwrap();
        let entries = result.downloads();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "xiaohongshu_image_abc_1.jpg");
        assert_eq!(entries[0].url, "https://img.example/1.jpg");
        assert_eq!(entries[1].filename, "xiaohongshu_image_abc_3.jpg");
        assert!(entries.iter().all(|e| e.kind == MediaKind::Image));
    }

    #[test]
    fn test_missing_script() {
        let err = parse_note_page("<html><script>var x;</script></html>", &request_headers())
            .unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
        assert!(err.to_string().starts_with("Failed to extract from Xiaohongshu"));
    }

    #[test]
    fn test_missing_note() {
        let html = page(r#"{"note":{"currentNoteId":"x","noteDetailMap":{}}}"#);
        assert!(parse_note_page(&html, &request_headers()).is_err());
    }

    #[test]
    fn test_no_media() {
        let html = page(r#"{"note":{"currentNoteId":"x","noteDetailMap":{"x":{"note":{"imageList":[]}}}}}"#);
        let err = parse_note_page(&html, &request_headers()).unwrap_err();
        assert!(err.to_string().contains("no downloadable media"));
    }

    #[test]
    fn test_https_rewrite() {
        assert_eq!(https("http://a.b/c"), "https://a.b/c");
        assert_eq!(https("https://a.b/c"), "https://a.b/c");
    }
}

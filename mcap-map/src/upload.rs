//! Upload form validation
//!
//! Turns what the viewer typed into the upload form into a new capsule.
//! Nothing is sent anywhere; the caller adds the capsule to the catalog.

use chrono::NaiveDate;
use mcap_common::{uuid_utils, Coordinate, MusicCapsule};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Raw upload form fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadDraft {
    pub youtube_url: String,
    /// Whitespace separated, with or without a leading `#`
    pub hashtags: String,
    pub description: String,
    pub location_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

impl UploadDraft {
    /// Check the form in the order the fields appear on screen
    pub fn validate(&self) -> Result<()> {
        let url = self.youtube_url.trim();
        if url.is_empty() {
            return Err(Error::Validation("a YouTube link is required".to_string()));
        }
        if !is_youtube_url(url) {
            return Err(Error::Validation(format!(
                "'{}' is not a YouTube link",
                url
            )));
        }
        if self.hashtags.trim().is_empty() {
            return Err(Error::Validation(
                "at least one hashtag is required".to_string(),
            ));
        }
        if self.location_name.trim().is_empty() {
            return Err(Error::Validation(
                "a capsule location is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and build the capsule, with a freshly generated id
    pub fn into_capsule(
        self,
        coordinate: Coordinate,
        uploaded_by: &str,
        uploaded_at: NaiveDate,
    ) -> Result<MusicCapsule> {
        self.validate()?;
        coordinate
            .validate()
            .map_err(|e| Error::Validation(format!("capsule position: {}", e)))?;

        let youtube_id = extract_video_id(self.youtube_url.trim()).ok_or_else(|| {
            Error::Validation(format!("no video id in '{}'", self.youtube_url.trim()))
        })?;

        let description = self.description.trim();
        Ok(MusicCapsule {
            id: uuid_utils::generate_id(),
            title: non_blank(self.title).unwrap_or_else(|| youtube_id.clone()),
            artist: non_blank(self.artist).unwrap_or_default(),
            thumbnail: format!("https://img.youtube.com/vi/{}/hqdefault.jpg", youtube_id),
            youtube_id,
            coordinate: Some(coordinate),
            hashtags: parse_hashtags(&self.hashtags),
            location: self.location_name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            uploaded_by: uploaded_by.to_string(),
            uploaded_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Path part after a YouTube host, accepting `http(s)://` and `www.` prefixes
fn youtube_path(url: &str) -> Option<(&str, &str)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    ["youtube.com", "youtu.be"]
        .into_iter()
        .find_map(|host| rest.strip_prefix(host)?.strip_prefix('/').map(|p| (host, p)))
}

/// `youtube.com/...` or `youtu.be/...` followed by at least one character
pub fn is_youtube_url(url: &str) -> bool {
    matches!(youtube_path(url), Some((_, path)) if !path.is_empty())
}

/// Video id from a watch, short, embed or shorts link
pub fn extract_video_id(url: &str) -> Option<String> {
    let (host, path) = youtube_path(url)?;
    let id = if host == "youtu.be" {
        first_segment(path)
    } else if let Some(rest) = path
        .strip_prefix("embed/")
        .or_else(|| path.strip_prefix("shorts/"))
    {
        first_segment(rest)
    } else {
        let query = path.split_once('?')?.1;
        let query = query.split('#').next().unwrap_or(query);
        query.split('&').find_map(|pair| pair.strip_prefix("v="))?
    };
    (!id.is_empty()).then(|| id.to_string())
}

fn first_segment(path: &str) -> &str {
    path.split(['?', '#', '/']).next().unwrap_or(path)
}

/// Split on whitespace, strip leading `#`, drop empties and repeats
pub fn parse_hashtags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split_whitespace() {
        let tag = raw.trim_start_matches('#');
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> UploadDraft {
        UploadDraft {
            youtube_url: "https://www.youtube.com/watch?v=bu7uwy6hUzI".to_string(),
            hashtags: "#流行 抒情  #流行".to_string(),
            description: "  afternoon  ".to_string(),
            location_name: "台北市信義區".to_string(),
            title: None,
            artist: Some("周杰倫".to_string()),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn test_url_shapes() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("http://youtu.be/abc"));
        assert!(is_youtube_url("youtube.com/embed/abc"));
        assert!(!is_youtube_url("https://youtube.com/"));
        assert!(!is_youtube_url("https://vimeo.com/123"));
        assert!(!is_youtube_url("ftp://youtube.com/watch?v=abc"));
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=qu_FSptjRic&t=30s").as_deref(),
            Some("qu_FSptjRic")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=x&v=abc#top").as_deref(),
            Some("abc")
        );
        assert_eq!(extract_video_id("https://youtu.be/VkDy8H2h8F8?si=1").as_deref(), Some("VkDy8H2h8F8"));
        assert_eq!(extract_video_id("youtube.com/embed/YjUGgaO3A_8").as_deref(), Some("YjUGgaO3A_8"));
        assert_eq!(extract_video_id("youtube.com/channel/xyz"), None);
    }

    #[test]
    fn test_parse_hashtags() {
        assert_eq!(parse_hashtags("#流行 抒情  #流行 # "), vec!["流行", "抒情"]);
        assert!(parse_hashtags("   ").is_empty());
    }

    #[test]
    fn test_validation_order() {
        let mut d = draft();
        d.youtube_url = "  ".to_string();
        d.hashtags.clear();
        let err = d.validate().unwrap_err().to_string();
        assert!(err.contains("YouTube link is required"));

        let mut d = draft();
        d.youtube_url = "https://example.com/song".to_string();
        assert!(d.validate().unwrap_err().to_string().contains("not a YouTube link"));

        let mut d = draft();
        d.hashtags = " ".to_string();
        assert!(d.validate().unwrap_err().to_string().contains("hashtag"));

        let mut d = draft();
        d.location_name.clear();
        assert!(d.validate().unwrap_err().to_string().contains("location"));
    }

    #[test]
    fn test_into_capsule() {
        let capsule = draft()
            .into_capsule(Coordinate::fallback(), "tester", date())
            .unwrap();
        assert_eq!(capsule.youtube_id, "bu7uwy6hUzI");
        assert_eq!(capsule.title, "bu7uwy6hUzI");
        assert_eq!(capsule.artist, "周杰倫");
        assert_eq!(capsule.hashtags, vec!["流行", "抒情"]);
        assert_eq!(capsule.description.as_deref(), Some("afternoon"));
        assert_eq!(capsule.coordinate, Some(Coordinate::fallback()));
        assert_eq!(capsule.uploaded_at, date());
        assert!(!capsule.id.is_empty());
    }

    #[test]
    fn test_into_capsule_blank_description_is_none() {
        let mut d = draft();
        d.description = "   ".to_string();
        let capsule = d.into_capsule(Coordinate::fallback(), "tester", date()).unwrap();
        assert!(capsule.description.is_none());
    }

    #[test]
    fn test_into_capsule_rejects_bad_position() {
        let result = draft().into_capsule(Coordinate::new(-91.0, 0.0), "tester", date());
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_into_capsule_requires_video_id() {
        let mut d = draft();
        d.youtube_url = "https://www.youtube.com/channel/UC123".to_string();
        assert!(d.into_capsule(Coordinate::fallback(), "tester", date()).is_err());
    }
}

/// Domain records and request payloads
use serde::{Deserialize, Serialize};

/// Geo-coordinates in double-precision degrees.
///
/// No range validation happens here; the index treats the pair as an opaque
/// geo-point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Media category derived from the uploaded file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Unknown,
}

impl MediaType {
    /// Fixed extension table; anything else maps to `Unknown`.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" | "gif" | "png" => MediaType::Image,
            "mov" | "mp4" | "avi" | "flv" | "wmv" => MediaType::Video,
            _ => MediaType::Unknown,
        }
    }
}

/// An indexed post. The document id is a UUID assigned once at ingestion and
/// never shown as a separate field; posts are immutable once indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub user: String,
    pub message: String,
    pub location: Location,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub face: f64,
}

/// Stored user record, keyed by username in the index. The secret is kept
/// only as an Argon2id hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub age: i64,
    pub gender: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        for ext in ["jpeg", "jpg", "gif", "png"] {
            assert_eq!(MediaType::from_extension(ext), MediaType::Image);
        }
        for ext in ["mov", "mp4", "avi", "flv", "wmv"] {
            assert_eq!(MediaType::from_extension(ext), MediaType::Video);
        }
        assert_eq!(MediaType::from_extension("xyz"), MediaType::Unknown);
        assert_eq!(MediaType::from_extension(""), MediaType::Unknown);
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(MediaType::from_extension("JPEG"), MediaType::Image);
        assert_eq!(MediaType::from_extension("Mp4"), MediaType::Video);
    }

    #[test]
    fn test_post_serializes_type_field() {
        let post = Post {
            user: "alice".to_string(),
            message: "hello".to_string(),
            location: Location { lat: 37.0, lon: -122.0 },
            url: "https://example.com/o".to_string(),
            media_type: MediaType::Image,
            face: 0.0,
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["location"]["lat"], 37.0);
        assert_eq!(value["face"], 0.0);
    }
}

/// Post ingestion and query handlers
///
/// Ingestion is strictly sequential with single-attempt semantics: upload,
/// then classify, then index. There is no compensation on partial failure;
/// a classifier or index failure after a successful upload leaves an
/// orphaned, publicly readable object behind.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt as _;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::{Location, MediaType, Post};
use crate::services::audit_log::{AuditLog, PostAuditRow};
use crate::services::classifier::FaceClassifier;
use crate::services::media_store::MediaStore;
use crate::services::post_index::{ClusterField, PostIndex, CLUSTER_THRESHOLD};

/// The one encoding the upstream classifier supports.
const CLASSIFIABLE_EXTENSION: &str = "jpeg";

#[derive(Debug, serde::Deserialize)]
pub struct SearchParams {
    pub lat: f64,
    pub lon: f64,
    /// Radius in kilometers; defaults to 200 km when omitted.
    pub range: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ClusterParams {
    pub term: String,
}

#[derive(Debug, Default)]
struct PostFields {
    lat: Option<f64>,
    lon: Option<f64>,
    message: String,
    file_name: Option<String>,
    file_bytes: Option<Vec<u8>>,
}

/// Ingest one post: multipart parse, media upload, conditional
/// classification, index insert, best-effort audit mirror.
pub async fn create_post(
    user: AuthenticatedUser,
    media: web::Data<MediaStore>,
    classifier: web::Data<FaceClassifier>,
    index: web::Data<PostIndex>,
    audit: web::Data<Option<AuditLog>>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let fields = read_post_fields(payload).await?;

    let lat = fields
        .lat
        .ok_or_else(|| AppError::BadRequest("missing or invalid field 'lat'".to_string()))?;
    let lon = fields
        .lon
        .ok_or_else(|| AppError::BadRequest("missing or invalid field 'lon'".to_string()))?;
    let (file_name, file_bytes) = match (fields.file_name, fields.file_bytes) {
        (Some(name), Some(bytes)) if !bytes.is_empty() => (name, bytes),
        _ => return Err(AppError::BadRequest("image is not available".to_string())),
    };

    let extension = extension_of(&file_name);
    let media_type = MediaType::from_extension(&extension);

    let id = Uuid::new_v4();
    let url = media
        .store(&id.to_string(), file_bytes.clone(), content_type_for(&extension))
        .await?;

    // The classifier only supports one encoding; other media types skip it.
    // Its failure aborts the whole request even though the media is already
    // durably stored.
    let face = if extension == CLASSIFIABLE_EXTENSION {
        classifier.annotate(&file_bytes).await?
    } else {
        0.0
    };

    let post = Post {
        user: user.0,
        message: fields.message,
        location: Location { lat, lon },
        url,
        media_type,
        face,
    };

    index.insert(&post, id).await?;

    // Fire-and-forget mirror; never part of the success contract.
    if let Some(audit) = audit.get_ref() {
        let audit = audit.clone();
        let row = PostAuditRow {
            id: id.to_string(),
            user: post.user.clone(),
            message: post.message.clone(),
            lat,
            lon,
        };
        tokio::spawn(async move {
            if let Err(err) = audit.record(&row).await {
                tracing::warn!(error = %err, post_id = %row.id, "audit mirror write failed");
            }
        });
    }

    Ok(HttpResponse::Ok().json(post))
}

/// Posts within `range` kilometers of the given point.
pub async fn search(
    index: web::Data<PostIndex>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let posts = index
        .search_radius(query.lat, query.lon, query.range)
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Posts whose named numeric field scores at or above the cluster
/// threshold. The field name is checked against a closed allow-list.
pub async fn cluster(
    index: web::Data<PostIndex>,
    query: web::Query<ClusterParams>,
) -> Result<HttpResponse> {
    let field = ClusterField::parse(&query.term)
        .ok_or_else(|| AppError::BadRequest(format!("unknown cluster field '{}'", query.term)))?;

    let posts = index.search_range(field, CLUSTER_THRESHOLD).await?;
    Ok(HttpResponse::Ok().json(posts))
}

async fn read_post_fields(mut payload: Multipart) -> Result<PostFields> {
    let mut fields = PostFields::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("multipart error: {}", e)))?;

        let name = field.name().map(str::to_string);
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes =
                chunk.map_err(|e| AppError::BadRequest(format!("multipart read error: {}", e)))?;
            data.extend_from_slice(&bytes);
        }

        match name.as_deref() {
            Some("lat") => fields.lat = Some(parse_coord(&data, "lat")?),
            Some("lon") => fields.lon = Some(parse_coord(&data, "lon")?),
            Some("message") => {
                fields.message = String::from_utf8(data).map_err(|_| {
                    AppError::BadRequest("field 'message' is not valid UTF-8".to_string())
                })?;
            }
            Some("image") => {
                fields.file_name = file_name;
                fields.file_bytes = Some(data);
            }
            // Unknown fields are drained and ignored.
            _ => {}
        }
    }

    Ok(fields)
}

/// Parse a numeric multipart field. Malformed input is rejected, never
/// silently zeroed.
fn parse_coord(raw: &[u8], field: &str) -> Result<f64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| AppError::BadRequest(format!("invalid numeric field '{}'", field)))
}

fn extension_of(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coord() {
        assert_eq!(parse_coord(b"37.0", "lat").unwrap(), 37.0);
        assert_eq!(parse_coord(b" -122.5 ", "lon").unwrap(), -122.5);
        assert!(parse_coord(b"", "lat").is_err());
        assert!(parse_coord(b"north", "lat").is_err());
        assert!(parse_coord(&[0xff, 0xfe], "lat").is_err());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPEG"), "jpeg");
        assert_eq!(extension_of("clip.tar.mp4"), "mp4");
        assert_eq!(extension_of("noext"), "");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("mov"), "video/quicktime");
        assert_eq!(content_type_for("xyz"), "application/octet-stream");
    }

    #[test]
    fn test_only_jpeg_is_classifiable() {
        assert_eq!(CLASSIFIABLE_EXTENSION, "jpeg");
        // jpg shares the media type but bypasses classification.
        assert_eq!(MediaType::from_extension("jpg"), MediaType::Image);
        assert_ne!("jpg", CLASSIFIABLE_EXTENSION);
    }
}

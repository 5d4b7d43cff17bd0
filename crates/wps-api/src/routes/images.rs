//! # Image Route
//!
//! `GET /<any-path>` serves the WebP artifact for the source image at the
//! same relative path. All decisions are made by
//! [`ImageCache`](crate::orchestration::ImageCache); the handler only shapes
//! the response.
//!
//! The path is taken from the raw URI and percent-decoded lossily, so a
//! non-UTF-8 escape such as `%FF` becomes U+FFFD and ends in the usual
//! 403/404 instead of a 400 from the extractor.

use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::percent_decode_str;

use wps_core::ARTIFACT_CONTENT_TYPE;

use crate::error::ImageError;
use crate::orchestration::ServedImage;
use crate::state::AppState;

/// Cache status header on every served artifact.
pub const X_CACHE: &str = "x-cache";

/// Assemble the image router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_image))
        .route("/{*path}", get(serve_image))
}

async fn serve_image(State(state): State<AppState>, uri: Uri) -> Result<Response, ImageError> {
    let path = request_path(&uri);
    let served = state.images.fetch(&path).await?;
    Ok(image_response(served))
}

/// Percent-decoded request path, with invalid UTF-8 replaced.
fn request_path(uri: &Uri) -> String {
    percent_decode_str(uri.path()).decode_utf8_lossy().into_owned()
}

fn image_response(served: ServedImage) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(ARTIFACT_CONTENT_TYPE)),
            (HeaderName::from_static(X_CACHE), HeaderValue::from_static(served.status.as_str())),
        ],
        served.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(uri: &str) -> String {
        request_path(&uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(decoded("/a%20b/caf%C3%A9.jpg"), "/a b/café.jpg");
        assert_eq!(decoded("/%63at.jpg?w=10"), "/cat.jpg");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decoded("/%FF.jpg"), "/\u{FFFD}.jpg");
    }

    #[test]
    fn root_is_slash() {
        assert_eq!(decoded("/"), "/");
    }
}

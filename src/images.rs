const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const DEFAULT_SIZE: &str = "original";

/// Returned for movies TMDB has no artwork for.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/500x750/171717/a3a3a3?text=No+Image";

/// Builds a CDN URL for a TMDB image path such as `/abc.jpg`.
pub fn image_url(path: Option<&str>, size: Option<&str>) -> String {
    let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
        return PLACEHOLDER_IMAGE.to_string();
    };
    let size = size.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SIZE);
    if path.starts_with('/') {
        format!("{IMAGE_BASE}/{size}{path}")
    } else {
        format!("{IMAGE_BASE}/{size}/{path}")
    }
}

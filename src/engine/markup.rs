//! Image placeholder substitution for generated slide markup.
//!
//! The slide collaborator never embeds a literal image URL; every image
//! reference in its markup is the reserved token below. Substitution is a
//! pure string operation: the token is literal text, so replacing it twice
//! is equivalent to replacing it once.

/// Reserved substitution point the collaborator places in slide markup.
pub const SLIDE_IMAGE_TOKEN: &str = "__SLIDE_IMAGE__";

/// Placeholder reference the visual collaborator degrades to on failure.
pub const FALLBACK_IMAGE_URL: &str =
    "https://placehold.co/1280x720/1a1a1a/FFF?text=Visual+Generating...";

/// Replace every occurrence of the reserved token with the resolved image
/// reference. No-op on markup without the token.
pub fn apply_image(html: &str, image_url: &str) -> String {
    html.replace(SLIDE_IMAGE_TOKEN, image_url)
}

/// Whether the markup still contains an unresolved image reference.
pub fn has_placeholder(html: &str) -> bool {
    html.contains(SLIDE_IMAGE_TOKEN)
}

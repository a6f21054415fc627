//! Image cache busting for prose that follows a cell that writes an image.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<img\s*src\s*=\s*"[^"]*?)(\?version=(\d+))?""#).expect("valid image regex")
});

/// Bump the `?version=N` query of every `<img src="...">` in `text`.
///
/// A source without the query gets `?version=1`. Returns `None` when the text
/// has no image reference.
pub fn bump_image_versions(text: &str) -> Option<String> {
    if !IMG_SRC.is_match(text) {
        return None;
    }

    let bumped = IMG_SRC.replace_all(text, |caps: &Captures<'_>| {
        let version = caps
            .get(3)
            .and_then(|n| n.as_str().parse::<u64>().ok())
            .map_or(1, |n| n.saturating_add(1));
        format!("{}?version={}\"", &caps[1], version)
    });

    Some(bumped.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_version() {
        assert_eq!(
            bump_image_versions(r#"<img src="a.png">"#).as_deref(),
            Some(r#"<img src="a.png?version=1">"#)
        );
    }

    #[test]
    fn test_increments_version() {
        assert_eq!(
            bump_image_versions(r#"<img src="a.png?version=3">"#).as_deref(),
            Some(r#"<img src="a.png?version=4">"#)
        );
    }

    #[test]
    fn test_multiple_images_and_surrounding_text() {
        let text = "Plot:\n<img src=\"plot.png\" width=\"300\">\nand <img src = \"b.svg?version=9\"/>";
        assert_eq!(
            bump_image_versions(text).as_deref(),
            Some(
                "Plot:\n<img src=\"plot.png?version=1\" width=\"300\">\nand <img src = \"b.svg?version=10\"/>"
            )
        );
    }

    #[test]
    fn test_no_image() {
        assert_eq!(bump_image_versions("![alt](a.png)"), None);
    }
}

//! GitHub-flavored markdown anchors for the table of contents.

/// Top-level section headings of a rendered specification, in order.
pub const SECTION_TITLES: [&str; 4] = [
    "1. Overview",
    "2. Screen Detail",
    "3. Interaction Flow",
    "4. Validation Procedures Detail",
];

/// GitHub heading anchor slug.
///
/// - lowercase
/// - keep alphanumerics (any script), spaces and hyphens
/// - replace spaces with hyphens
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

pub fn render_toc_link(title: &str) -> String {
    format!("[{}](#{})", title, github_slug(title))
}

/// A TOC list item.
pub fn render_toc_item(title: &str) -> String {
    format!("- {}", render_toc_link(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_numbered_heading() {
        assert_eq!(github_slug("1. Overview"), "1-overview");
        assert_eq!(
            github_slug("4. Validation Procedures Detail"),
            "4-validation-procedures-detail"
        );
    }

    #[test]
    fn slug_keeps_vietnamese() {
        assert_eq!(github_slug("Mục lục"), "mục-lục");
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(github_slug("Error: Codes_(1)"), "error-codes1");
    }

    #[test]
    fn toc_item() {
        assert_eq!(
            render_toc_item("2. Screen Detail"),
            "- [2. Screen Detail](#2-screen-detail)"
        );
    }
}

/// Placeholder filter shared by every label strategy.
use rustc_hash::FxHashSet;

/// Rejects blank strings and authoring scaffolding such as editor
/// default texts. Matching is case-insensitive on the trimmed text.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderFilter {
    blacklist: FxHashSet<String>,
}

impl PlaceholderFilter {
    pub fn new<I, S>(placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blacklist: placeholders
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn is_placeholder(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty() || self.blacklist.contains(&trimmed.to_lowercase())
    }

    /// The trimmed text if it is narratable.
    pub fn accept(&self, text: &str) -> Option<String> {
        if self.is_placeholder(text) {
            None
        } else {
            Some(text.trim().to_string())
        }
    }

    /// Same as [`accept`](Self::accept) for an optional value.
    pub fn accept_opt(&self, text: Option<String>) -> Option<String> {
        text.and_then(|t| self.accept(&t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PlaceholderFilter {
        PlaceholderFilter::new(["New Text", "button"])
    }

    #[test]
    fn rejects_blank() {
        let f = filter();
        assert!(f.is_placeholder(""));
        assert!(f.is_placeholder("   \t"));
        assert_eq!(f.accept("\n"), None);
    }

    #[test]
    fn rejects_blacklist_case_insensitive() {
        let f = filter();
        assert!(f.is_placeholder("new text"));
        assert!(f.is_placeholder("  NEW TEXT "));
        assert!(f.is_placeholder("Button"));
    }

    #[test]
    fn accepts_and_trims_real_text() {
        let f = filter();
        assert_eq!(f.accept("  Potion x3 ").as_deref(), Some("Potion x3"));
        assert_eq!(f.accept("New Texture").as_deref(), Some("New Texture"));
        assert_eq!(f.accept_opt(None), None);
    }
}

/// Knobs that influence evaluation without changing expression structure.
///
/// Passed by reference into every evaluation; the defaults match the
/// invariant-culture behavior most callers want.
#[derive(Debug, Clone)]
pub struct Options {
    /// BCP-47 locale tag used by locale-sensitive formatting, when set.
    pub locale: Option<String>,

    /// Separator used when an array is rendered as a string and when
    /// `join` is called without an explicit separator.
    pub list_separator: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            locale: None,
            list_separator: ",".to_string(),
        }
    }
}

impl Options {
    /// Options with an explicit locale tag.
    pub fn with_locale(locale: &str) -> Self {
        Options {
            locale: Some(locale.to_string()),
            ..Options::default()
        }
    }
}

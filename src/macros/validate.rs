//! Domain validators: URL rules and symbol-name lookup.

use crate::diagnostics::MacroFailure;
use crate::errors::SigilError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, trace};
use url::{ParseError, Url};

/// Scheme reported when the text has no scheme at all.
pub const MISSING_SCHEME: &str = "?";

// ============================================================================
// URL
// ============================================================================

/// Which URLs the URL macro accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlPolicy {
    /// Allowed schemes, compared case-insensitively.
    pub allowed_schemes: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".into(), "https".into()],
        }
    }
}

impl UrlPolicy {
    pub fn allows(&self, scheme: &str) -> bool {
        self.allowed_schemes
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
    }
}

/// Checks, in order, that `text` parses as a URL, that its scheme is allowed
/// and that its host is non-empty. Stops at the first failure.
pub fn validate_url(text: &str, policy: &UrlPolicy) -> Result<(), MacroFailure> {
    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(MacroFailure::InvalidUrl);
    }
    // The parser reads `\` as `/`; the emitted literal would keep it.
    if text.contains('\\') {
        return Err(MacroFailure::InvalidUrl);
    }
    // Without `//` after the colon there is no authority, hence no host,
    // even where the parser would recover one.
    if let Some(scheme) = leading_scheme(text) {
        if !text[scheme.len() + 1..].starts_with("//") {
            check_scheme(scheme, policy)?;
            return Err(MacroFailure::InvalidUrlHost);
        }
    }

    let url = match Url::parse(text) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            return Err(MacroFailure::InvalidUrlScheme {
                scheme: MISSING_SCHEME.into(),
            })
        }
        // `https://` parses as far as the scheme; the scheme rule still
        // comes before the host rule.
        Err(ParseError::EmptyHost) => {
            let scheme = leading_scheme(text).unwrap_or(MISSING_SCHEME);
            check_scheme(scheme, policy)?;
            return Err(MacroFailure::InvalidUrlHost);
        }
        Err(error) => {
            trace!("url rejected by parser: {error}");
            return Err(MacroFailure::InvalidUrl);
        }
    };

    check_scheme(url.scheme(), policy)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(MacroFailure::InvalidUrlHost),
    }
}

fn check_scheme(scheme: &str, policy: &UrlPolicy) -> Result<(), MacroFailure> {
    if policy.allows(scheme) {
        Ok(())
    } else {
        Err(MacroFailure::InvalidUrlScheme {
            scheme: scheme.to_string(),
        })
    }
}

/// `scheme` in `scheme:rest`, following the URI scheme grammar.
fn leading_scheme(text: &str) -> Option<&str> {
    let (scheme, _) = text.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

// ============================================================================
// SYMBOLS
// ============================================================================

/// Read-only catalog of platform symbol names.
///
/// Queried concurrently from parallel expansion; implementations must not
/// rely on interior mutation.
pub trait SymbolCatalog: Send + Sync {
    fn exists(&self, name: &str) -> bool;
}

impl<F> SymbolCatalog for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, name: &str) -> bool {
        self(name)
    }
}

/// In-memory symbol catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet {
    names: HashSet<String>,
}

impl SymbolSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// One name per line. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn load(path: &Path) -> Result<Self, SigilError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SigilError::io(path.display().to_string(), e))?;
        let set = Self::parse(&text);
        debug!("Loaded {} symbol name(s) from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SymbolCatalog for SymbolSet {
    fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Checks `name` against the catalog. Without a catalog nothing is checked.
pub fn validate_symbol_name(
    name: &str,
    catalog: Option<&dyn SymbolCatalog>,
) -> Result<(), MacroFailure> {
    let Some(catalog) = catalog else {
        debug!("No symbol catalog configured; accepting \"{name}\" unchecked");
        return Ok(());
    };
    if catalog.exists(name) {
        Ok(())
    } else {
        Err(MacroFailure::InvalidSymbolName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str) -> Result<(), MacroFailure> {
        validate_url(text, &UrlPolicy::default())
    }

    fn scheme(name: &str) -> MacroFailure {
        MacroFailure::InvalidUrlScheme {
            scheme: name.into(),
        }
    }

    #[test]
    fn accepts_web_urls() {
        assert_eq!(check("https://apple.com"), Ok(()));
        assert_eq!(check("http://example.org/path?q=1#frag"), Ok(()));
        assert_eq!(check("HTTPS://apple.com"), Ok(()));
    }

    #[test]
    fn unparseable_text_is_invalid() {
        assert_eq!(check(""), Err(MacroFailure::InvalidUrl));
        assert_eq!(check("not a url"), Err(MacroFailure::InvalidUrl));
        assert_eq!(check("http://[::1"), Err(MacroFailure::InvalidUrl));
    }

    #[test]
    fn scheme_is_checked_before_host() {
        assert_eq!(check("ftp://www.apple.com"), Err(scheme("ftp")));
        assert_eq!(check("apple.com"), Err(scheme(MISSING_SCHEME)));
        assert_eq!(check("mailto:someone@apple.com"), Err(scheme("mailto")));
        assert_eq!(check("ftp://"), Err(scheme("ftp")));
    }

    #[test]
    fn empty_host_is_rejected_last() {
        assert_eq!(check("https://"), Err(MacroFailure::InvalidUrlHost));
    }

    #[test]
    fn authority_must_follow_the_scheme() {
        assert_eq!(check("https:apple.com"), Err(MacroFailure::InvalidUrlHost));
        assert_eq!(check("https:/apple.com"), Err(MacroFailure::InvalidUrlHost));
        assert_eq!(check("ftp:apple.com"), Err(scheme("ftp")));
    }

    #[test]
    fn backslashes_are_not_path_separators() {
        assert_eq!(check(r"https:\\apple.com"), Err(MacroFailure::InvalidUrl));
        assert_eq!(check("http://apple.com\\path"), Err(MacroFailure::InvalidUrl));
    }

    #[test]
    fn policy_is_configurable() {
        let policy = UrlPolicy {
            allowed_schemes: vec!["FTP".into()],
        };
        assert_eq!(validate_url("ftp://www.apple.com", &policy), Ok(()));
        assert_eq!(
            validate_url("https://apple.com", &policy),
            Err(scheme("https"))
        );
    }

    #[test]
    fn symbol_files_skip_comments_and_blanks() {
        let set = SymbolSet::parse("# symbols\ncalendar\n\n  star.fill  \n");
        assert_eq!(set.len(), 2);
        assert!(set.exists("star.fill"));
        assert!(!set.exists("# symbols"));
    }

    #[test]
    fn missing_catalog_skips_validation() {
        assert_eq!(validate_symbol_name("dragon", None), Ok(()));
        let set = SymbolSet::from_names(["calendar"]);
        assert_eq!(
            validate_symbol_name("dragon", Some(&set)),
            Err(MacroFailure::InvalidSymbolName {
                name: "dragon".into()
            })
        );
        let everything = |_: &str| true;
        assert_eq!(validate_symbol_name("dragon", Some(&everything)), Ok(()));
    }
}

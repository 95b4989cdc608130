//! URL normalization helpers shared by stubs, passthrough rules and assertions.

use regex::Regex;
use url::Url;

/// Normalize a URL so that an empty path becomes `/`.
///
/// Unparseable input is returned unchanged.
pub fn ensure_default_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}

/// Scheme, host, port and path of a URL with query and fragment removed.
pub(crate) fn base_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

pub(crate) fn has_unicode(value: &str) -> bool {
    !value.is_ascii()
}

/// Host portion of `scheme://[user@]host[:port]/...` as written.
fn raw_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// IDNA-encode the host and percent-encode every other non-ASCII character.
pub fn clean_unicode(url: &str) -> String {
    if !has_unicode(url) {
        return url.to_string();
    }

    let mut cleaned = url.to_string();
    if let (Some(original), Ok(parsed)) = (raw_host(url), Url::parse(url)) {
        if let Some(ascii) = parsed.host_str() {
            if has_unicode(original) {
                cleaned = cleaned.replacen(original, ascii, 1);
            }
        }
    }

    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    out
}

/// Wrap a pattern so it only matches the whole input.
pub(crate) fn anchored(regex: &Regex) -> Regex {
    Regex::new(&format!("^(?:{})$", regex.as_str())).unwrap_or_else(|_| regex.clone())
}

/// True when the pattern matches starting at the first character.
pub(crate) fn matches_from_start(regex: &Regex, text: &str) -> bool {
    regex.find(text).is_some_and(|m| m.start() == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_default_path() {
        assert_eq!(ensure_default_path("http://example.com"), "http://example.com/");
        assert_eq!(
            ensure_default_path("http://example.com?q=1"),
            "http://example.com/?q=1"
        );
        assert_eq!(ensure_default_path("not a url"), "not a url");
    }

    #[test]
    fn test_base_url_strips_query_and_fragment() {
        assert_eq!(
            base_url("http://example.com/a?b=1#frag"),
            "http://example.com/a"
        );
        assert_eq!(base_url("http://example.com"), "http://example.com/");
    }

    #[test]
    fn test_clean_unicode_host_and_path() {
        assert_eq!(
            clean_unicode("http://münchen.de/straße"),
            "http://xn--mnchen-3ya.de/stra%C3%9Fe"
        );
        assert_eq!(clean_unicode("http://example.com/"), "http://example.com/");
    }

    #[test]
    fn test_anchored_requires_full_match() {
        let re = Regex::new(r"http://example\.com/\d+").unwrap();
        let full = anchored(&re);
        assert!(full.is_match("http://example.com/42"));
        assert!(!full.is_match("http://example.com/42/more"));
    }

    #[test]
    fn test_matches_from_start() {
        let re = Regex::new(r"http://api\.").unwrap();
        assert!(matches_from_start(&re, "http://api.example.com/"));
        assert!(!matches_from_start(&re, "https://x/?next=http://api.example.com"));
    }
}

//! Grouping identity for URLs.
//!
//! Single-page apps such as Google Docs encode view state in the fragment, so
//! for hosts on the ignore list two URLs that only differ after the path are the
//! same page. The key is `origin + path`, which drops the query string as well
//! as the fragment. Every other URL is its own key, byte for byte.

use hashlink::LinkedHashMap;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid url '{url}': {reason}")]
pub struct InvalidUrlError {
    pub url: String,
    pub reason: String,
}

/// Host as the browser reports it: hostname plus an explicit port.
fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

pub fn canonical_key(url: &str, ignored_hosts: &[String]) -> Result<String, InvalidUrlError> {
    let parsed = Url::parse(url).map_err(|e| InvalidUrlError {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let host = host_with_port(&parsed);
    // A blank entry would otherwise match every host.
    let ignore_hash = ignored_hosts
        .iter()
        .map(|h| h.trim())
        .any(|h| !h.is_empty() && host.ends_with(h));
    if ignore_hash {
        Ok(format!("{}{}", parsed.origin().ascii_serialization(), parsed.path()))
    } else {
        Ok(url.to_string())
    }
}

/// Group `items` by the canonical key of their URL, keeping first-seen order.
///
/// Items without a URL or with an unparsable one each get a singleton group of
/// their own and never merge with anything else.
pub fn group_by_url<T, F>(
    items: Vec<T>,
    url_of: F,
    ignored_hosts: &[String],
) -> LinkedHashMap<String, Vec<T>>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut groups: LinkedHashMap<String, Vec<T>> = LinkedHashMap::new();
    let mut ungroupable = 0usize;
    for item in items {
        let key = match url_of(&item).map(|u| canonical_key(u, ignored_hosts)) {
            Some(Ok(key)) => key,
            Some(Err(err)) => {
                tracing::debug!(%err, "treating url as ungroupable");
                ungroupable += 1;
                format!("\u{0}ungroupable:{ungroupable}")
            }
            None => {
                ungroupable += 1;
                format!("\u{0}ungroupable:{ungroupable}")
            }
        };
        groups.entry(key).or_insert_with(Vec::new).push(item);
    }
    groups
}

/// Keep only the first item for each canonical key.
pub fn one_per_url<T, F>(items: Vec<T>, url_of: F, ignored_hosts: &[String]) -> Vec<T>
where
    F: Fn(&T) -> Option<&str>,
{
    group_by_url(items, url_of, ignored_hosts)
        .into_iter()
        .filter_map(|(_, mut group)| {
            if group.is_empty() {
                None
            } else {
                Some(group.swap_remove(0))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec!["docs.google.com".into(), ".quip.com".into()]
    }

    #[test]
    fn fragments_collapse_on_ignored_hosts() {
        let a = canonical_key("https://docs.google.com/document/d/1#heading=h.1", &hosts()).unwrap();
        let b = canonical_key("https://docs.google.com/document/d/1#heading=h.2", &hosts()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "https://docs.google.com/document/d/1");
    }

    #[test]
    fn query_is_dropped_on_ignored_hosts() {
        let a = canonical_key("https://team.quip.com/abc?x=1", &hosts()).unwrap();
        let b = canonical_key("https://team.quip.com/abc?x=2", &hosts()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn other_hosts_keep_literal_url() {
        let url = "https://Example.com/a?b=1#c";
        assert_eq!(canonical_key(url, &hosts()).unwrap(), url);
    }

    #[test]
    fn blank_ignored_host_matches_nothing() {
        let hosts = vec![String::new(), "  ".to_string()];
        let url = "https://www.google.com/search?q=rust";
        assert_eq!(canonical_key(url, &hosts).unwrap(), url);
    }

    #[test]
    fn unparsable_url_is_an_error() {
        let err = canonical_key("not a url", &hosts()).unwrap_err();
        assert_eq!(err.url, "not a url");
    }

    #[test]
    fn one_per_url_keeps_first_seen() {
        let items = vec![
            ("a", "https://docs.google.com/d/1#x"),
            ("b", "https://docs.google.com/d/1#y"),
            ("c", "https://example.com/"),
            ("d", "::bad::"),
            ("e", "::bad::"),
        ];
        let kept = one_per_url(items, |(_, u)| Some(*u), &hosts());
        let names: Vec<_> = kept.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "c", "d", "e"]);
    }
}

//! Query routing and matching.
//!
//! A leading `/word` picks the scope, the remainder is matched against the
//! items eligible in that scope. Free text matches everything and resolves
//! custom search shortcuts into concrete URLs.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::actions::commands::commands;
use crate::actions::{ActionTag, Item, ItemKind, SEARCH_TERMS_PLACEHOLDER};

static TABS_RE: Lazy<Regex> = Lazy::new(|| scope_regex("tabs"));
static ACTIONS_RE: Lazy<Regex> = Lazy::new(|| scope_regex("actions"));
static REMOVE_RE: Lazy<Regex> = Lazy::new(|| scope_regex("remove"));
static HISTORY_RE: Lazy<Regex> = Lazy::new(|| scope_regex("history"));
static BOOKMARKS_RE: Lazy<Regex> = Lazy::new(|| scope_regex("bookmarks"));

fn scope_regex(word: &str) -> Regex {
    Regex::new(&format!(r"(?i)^/{word}(\s+|$)")).expect("valid scope regex")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Tabs,
    Actions,
    Remove,
    History,
    Bookmarks,
    /// A `/` query naming no known scope; shows the scope commands.
    Commands,
    FreeText,
}

impl Scope {
    /// Split `query` into its scope and the remainder after the scope word.
    ///
    /// Only the scope word and the whitespace directly after it are removed;
    /// the remainder is returned verbatim.
    pub fn parse(query: &str) -> (Scope, &str) {
        let table: [(&Lazy<Regex>, Scope); 5] = [
            (&TABS_RE, Scope::Tabs),
            (&ACTIONS_RE, Scope::Actions),
            (&REMOVE_RE, Scope::Remove),
            (&HISTORY_RE, Scope::History),
            (&BOOKMARKS_RE, Scope::Bookmarks),
        ];
        for (re, scope) in table {
            if let Some(m) = re.find(query) {
                return (scope, &query[m.end()..]);
            }
        }
        if query.starts_with('/') {
            (Scope::Commands, query)
        } else {
            (Scope::FreeText, query)
        }
    }

    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Scope::Tabs => Some("/tabs"),
            Scope::Actions => Some("/actions"),
            Scope::Remove => Some("/remove"),
            Scope::History => Some("/history"),
            Scope::Bookmarks => Some("/bookmarks"),
            Scope::Commands | Scope::FreeText => None,
        }
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn select(items: &[Item], pred: impl Fn(&Item) -> bool) -> Vec<Item> {
    items.iter().filter(|i| pred(i)).cloned().collect()
}

/// Shortcuts match the first query word regardless of case.
pub(crate) fn shortcut_matches(item: &Item, word_lower: &str) -> bool {
    item.shortcut().is_some_and(|s| s.to_lowercase() == word_lower)
}

fn title_or_url_contains(item: &Item, needle_lower: &str) -> bool {
    contains_ci(&item.title, needle_lower)
        || item.url().is_some_and(|u| contains_ci(u, needle_lower))
}

/// Turn a custom search template into a URL action for `rest`.
pub fn resolve_custom_search(item: &Item, rest: &str) -> Option<Item> {
    let ItemKind::CustomSearch { custom } = &item.kind else {
        return None;
    };
    let url = custom
        .url
        .replace(SEARCH_TERMS_PLACEHOLDER, &urlencoding::encode(rest));
    let desc = if rest.is_empty() {
        format!("Search {}", item.title)
    } else {
        format!("Search {} for \"{}\"", item.title, rest)
    };
    Some(Item {
        desc,
        kind: ItemKind::StaticAction {
            action: ActionTag::Url,
            url: Some(url),
            permission: None,
        },
        ..item.clone()
    })
}

pub struct ActionFilter {
    matcher: SkimMatcherV2,
    fuzzy_fallback: bool,
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ActionFilter {
    /// With `fuzzy_fallback`, a free-text query that matches nothing by
    /// substring is retried with fuzzy matching and ranked by score.
    pub fn new(fuzzy_fallback: bool) -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
            fuzzy_fallback,
        }
    }

    pub fn filter(&self, query: &str, items: &[Item]) -> Vec<Item> {
        let (scope, rest) = Scope::parse(query);
        let needle = rest.to_lowercase();
        match scope {
            Scope::Tabs => select(items, |i| i.is_tab() && title_or_url_contains(i, &needle)),
            Scope::Actions => select(items, |i| {
                i.is_static_action() && contains_ci(&i.title, &needle)
            }),
            Scope::Remove => select(items, |i| {
                (i.is_static_action() || i.is_tab()) && title_or_url_contains(i, &needle)
            }),
            Scope::Bookmarks => select(items, |i| {
                i.is_bookmark() && (needle.is_empty() || title_or_url_contains(i, &needle))
            }),
            // History results come from the history source; only pass them through.
            Scope::History => select(items, Item::is_history),
            Scope::Commands => commands()
                .into_iter()
                .filter(|c| match &c.kind {
                    ItemKind::Command { search_prefix, .. } => {
                        search_prefix.starts_with(&query.to_lowercase())
                    }
                    _ => false,
                })
                .collect(),
            Scope::FreeText => self.free_text(query, items),
        }
    }

    fn free_text(&self, query: &str, items: &[Item]) -> Vec<Item> {
        if query.is_empty() {
            return items.to_vec();
        }
        let needle = query.to_lowercase();
        let (first_word, rest) = match query.split_once(' ') {
            Some((first, rest)) => (first.to_lowercase(), Some(rest)),
            None => (needle.clone(), None),
        };

        let matched: Vec<Item> = items
            .iter()
            .filter(|i| title_or_url_contains(i, &needle) || shortcut_matches(i, &first_word))
            .map(|i| match rest {
                Some(rest) if i.is_custom_search() && shortcut_matches(i, &first_word) => {
                    resolve_custom_search(i, rest).unwrap_or_else(|| i.clone())
                }
                _ => i.clone(),
            })
            .collect();

        if matched.is_empty() && self.fuzzy_fallback {
            return self.fuzzy(query, items);
        }
        matched
    }

    fn fuzzy(&self, query: &str, items: &[Item]) -> Vec<Item> {
        let mut scored: Vec<(i64, &Item)> = items
            .iter()
            .filter_map(|i| {
                let title = self.matcher.fuzzy_match(&i.title, query);
                let url = i.url().and_then(|u| self.matcher.fuzzy_match(u, query));
                title.max(url).map(|s| (s, i))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, i)| i.clone()).collect()
    }
}

/// Filter with substring matching only.
pub fn filter(query: &str, items: &[Item]) -> Vec<Item> {
    ActionFilter::default().filter(query, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_scope_word_and_whitespace() {
        assert_eq!(Scope::parse("/tabs foo"), (Scope::Tabs, "foo"));
        assert_eq!(Scope::parse("/TABS  foo bar"), (Scope::Tabs, "foo bar"));
        assert_eq!(Scope::parse("/bookmarks"), (Scope::Bookmarks, ""));
        assert_eq!(Scope::parse("/tabsfoo"), (Scope::Commands, "/tabsfoo"));
        assert_eq!(Scope::parse("/zz"), (Scope::Commands, "/zz"));
        assert_eq!(Scope::parse("hello"), (Scope::FreeText, "hello"));
    }

    #[test]
    fn unknown_slash_lists_matching_commands() {
        let found = filter("/b", &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Bookmarks");
        assert_eq!(filter("/", &[]).len(), 5);
    }

    #[test]
    fn resolve_keeps_empty_rest_description_short() {
        let item = Item::from_custom(crate::actions::CustomAction {
            id: None,
            title: "Wiki".into(),
            desc: String::new(),
            url: "https://w.org/?s={searchTerms}".into(),
            shortcut: Some("w".into()),
            fav_icon_url: None,
            open_search_xml_url: None,
        });
        let resolved = resolve_custom_search(&item, "").unwrap();
        assert_eq!(resolved.desc, "Search Wiki");
        assert_eq!(resolved.url(), Some("https://w.org/?s="));
        let spaced = resolve_custom_search(&item, "a  b").unwrap();
        assert_eq!(spaced.url(), Some("https://w.org/?s=a%20%20b"));
    }

    #[test]
    fn shortcut_word_is_case_insensitive() {
        let item = Item::from_custom(crate::actions::CustomAction {
            id: None,
            title: "GitHub".into(),
            desc: String::new(),
            url: "https://github.com/search?q={searchTerms}".into(),
            shortcut: Some("gh".into()),
            fav_icon_url: None,
            open_search_xml_url: None,
        });
        let found = filter("GH openai", &[item]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url(), Some("https://github.com/search?q=openai"));
    }
}

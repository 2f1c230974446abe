use super::{Item, ItemKind};

/// Scope commands: (title, search prefix, shortcut, emoji).
const COMMANDS: &[(&str, &str, &str, Option<&str>)] = &[
    ("History", "/history", "/h", Some("🏛")),
    ("Tabs", "/tabs", "/t", None),
    ("Bookmarks", "/bookmarks", "/b", Some("📕")),
    ("Actions", "/actions", "/a", None),
    ("Remove", "/remove", "/r", Some("🧹")),
];

pub fn commands() -> Vec<Item> {
    COMMANDS
        .iter()
        .map(|(title, prefix, shortcut, emoji)| Item {
            id: None,
            title: (*title).to_string(),
            desc: format!("Search {}", title.to_lowercase()),
            fav_icon_url: None,
            emoji: emoji.map(str::to_string),
            key_binding: Vec::new(),
            kind: ItemKind::Command {
                search_prefix: (*prefix).to_string(),
                shortcut: (*shortcut).to_string(),
            },
        })
        .collect()
}

/// Expand an exact command shortcut such as `/t` into `"/tabs "`.
pub fn expand_shortcut(input: &str) -> Option<String> {
    COMMANDS
        .iter()
        .find(|(_, _, shortcut, _)| *shortcut == input)
        .map(|(_, prefix, _, _)| format!("{prefix} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_expand_to_prefixes() {
        assert_eq!(expand_shortcut("/t").as_deref(), Some("/tabs "));
        assert_eq!(expand_shortcut("/h").as_deref(), Some("/history "));
        assert_eq!(expand_shortcut("/tabs"), None);
        assert_eq!(expand_shortcut("/x"), None);
    }

    #[test]
    fn every_command_carries_prefix_and_shortcut() {
        let cmds = commands();
        assert_eq!(cmds.len(), 5);
        for c in &cmds {
            match &c.kind {
                ItemKind::Command { search_prefix, shortcut } => {
                    assert!(search_prefix.starts_with('/'));
                    assert!(search_prefix.starts_with(shortcut.as_str()));
                }
                other => panic!("unexpected kind {other:?}"),
            }
        }
    }
}

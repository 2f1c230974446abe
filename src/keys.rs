use serde::{Deserialize, Serialize};

use crate::actions::{ActionTag, Item};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    pub fn is_mac(&self) -> bool {
        matches!(self, Platform::Mac)
    }
}

/// Bindings that differ entirely off macOS.
fn replacement(tag: ActionTag) -> Option<&'static [&'static str]> {
    match tag {
        ActionTag::Reload => Some(&["F5"]),
        ActionTag::Fullscreen => Some(&["F11"]),
        ActionTag::Downloads => Some(&["Ctrl", "J"]),
        ActionTag::History => Some(&["Ctrl", "H"]),
        ActionTag::GoBack => Some(&["Alt", "←"]),
        ActionTag::GoForward => Some(&["Alt", "→"]),
        ActionTag::ScrollTop => Some(&["Home"]),
        ActionTag::ScrollBottom => Some(&["End"]),
        _ => None,
    }
}

fn modifier(symbol: &str) -> &str {
    match symbol {
        "⌘" => "Ctrl",
        "⌥" => "Alt",
        other => other,
    }
}

/// Rewrite an item's key binding for `platform`.
pub fn adjust_key_binding(item: &mut Item, platform: Platform) {
    if platform.is_mac() || item.key_binding.is_empty() {
        return;
    }
    if let Some(keys) = item.action_tag().and_then(replacement) {
        item.key_binding = keys.iter().map(|k| k.to_string()).collect();
        return;
    }
    item.key_binding = item
        .key_binding
        .iter()
        .map(|k| modifier(k).to_string())
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(tag: ActionTag, keys: &[&str]) -> Item {
        Item::static_action("t", "d", tag).with_keys(keys)
    }

    #[test]
    fn mac_bindings_untouched() {
        let mut item = action(ActionTag::Reload, &["⌘", "⇧", "R"]);
        adjust_key_binding(&mut item, Platform::Mac);
        assert_eq!(item.key_binding, vec!["⌘", "⇧", "R"]);
    }

    #[test]
    fn table_entries_replace_whole_binding() {
        let mut reload = action(ActionTag::Reload, &["⌘", "⇧", "R"]);
        adjust_key_binding(&mut reload, Platform::Other);
        assert_eq!(reload.key_binding, vec!["F5"]);

    }

    #[test]
    fn settings_binding_keeps_its_key() {
        let mut settings = action(ActionTag::Settings, &["⌘", ","]);
        adjust_key_binding(&mut settings, Platform::Other);
        assert_eq!(settings.key_binding, vec!["Ctrl", ","]);
    }

    #[test]
    fn modifiers_are_substituted() {
        let mut pin = action(ActionTag::Pin, &["⌥", "⇧", "P"]);
        adjust_key_binding(&mut pin, Platform::Other);
        assert_eq!(pin.key_binding, vec!["Alt", "⇧", "P"]);

        let mut close = action(ActionTag::CloseTab, &["⌘", "W"]);
        adjust_key_binding(&mut close, Platform::Other);
        assert_eq!(close.key_binding, vec!["Ctrl", "W"]);
    }
}

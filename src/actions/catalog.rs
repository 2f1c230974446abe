use super::{ActionTag, Item};
use crate::sources::Tab;

pub const BROWSING_DATA_PERMISSION: &str = "browsingData";

/// Quick-create links: (title, description, url, emoji).
const CREATE_LINKS: &[(&str, &str, &str, Option<&str>)] = &[
    ("New Notion page", "Create a new Notion page", "https://notion.new", None),
    ("New Sheets spreadsheet", "Create a new Google Sheets spreadsheet", "https://sheets.new", None),
    ("New Docs document", "Create a new Google Docs document", "https://docs.new", None),
    ("New Slides presentation", "Create a new Google Slides presentation", "https://slides.new", None),
    ("New form", "Create a new Google Forms form", "https://forms.new", None),
    ("New Medium story", "Create a new Medium story", "https://story.new", None),
    ("New GitHub repository", "Create a new GitHub repository", "https://github.new", None),
    ("New GitHub gist", "Create a new GitHub gist", "https://gist.new", None),
    ("New CodePen pen", "Create a new CodePen pen", "https://pen.new", None),
    ("New Excel spreadsheet", "Create a new Excel spreadsheet", "https://excel.new", None),
    ("New PowerPoint presentation", "Create a new PowerPoint presentation", "https://powerpoint.new", None),
    ("New Word document", "Create a new Word document", "https://word.new", None),
    ("Create a whiteboard", "Create a collaborative whiteboard", "https://whiteboard.new", Some("🧑‍🏫")),
    ("Record a video", "Record and edit a video", "https://recording.new", Some("📹")),
    ("Create a Figma file", "Create a new Figma file", "https://figma.new", None),
    ("Create a FigJam file", "Create a new FigJam file", "https://figjam.new", Some("🖌")),
    ("Hunt a product", "Submit a product to Product Hunt", "https://www.producthunt.com/posts/new", None),
    ("Make a tweet", "Make a tweet on Twitter", "https://twitter.com/intent/tweet", None),
    ("Create a playlist", "Create a Spotify playlist", "https://playlist.new", None),
    ("Create a Canva design", "Create a new design with Canva", "https://design.new", None),
    ("Create a new podcast episode", "Create a new podcast episode with Anchor", "https://episode.new", None),
    ("Edit an image", "Edit an image with Adobe Photoshop", "https://photo.new", None),
    ("Convert to PDF", "Convert a file to PDF", "https://pdf.new", Some("📄")),
    ("Scan a QR code", "Scan a QR code with your camera", "https://scan.new", None),
    ("Add a task to Asana", "Create a new task in Asana", "https://task.new", None),
    ("Add an issue to Linear", "Create a new issue in Linear", "https://linear.new", None),
    ("Add a task to WIP", "Create a new task in WIP", "https://todo.new", None),
    ("Create an event", "Add an event to Google Calendar", "https://cal.new", None),
    ("Add a note", "Add a note to Google Keep", "https://note.new", None),
    ("New meeting", "Start a Google Meet meeting", "https://meet.new", None),
];

/// Browsing-data actions: (title, description, tag, emoji).
const CLEAR_DATA: &[(&str, &str, ActionTag, &str)] = &[
    ("Clear all browsing data", "Clear all of your browsing data", ActionTag::ClearAllBrowsingData, "🧹"),
    ("Clear browsing history", "Clear all of your browsing history", ActionTag::ClearHistory, "🗂"),
    ("Clear cookies", "Clear all cookies", ActionTag::ClearCookies, "🍪"),
    ("Clear cache", "Clear the cache", ActionTag::ClearCache, "🗄"),
    ("Clear local storage", "Clear the local storage", ActionTag::ClearLocalStorage, "📦"),
    ("Clear passwords", "Clear all saved passwords", ActionTag::ClearPasswords, "🔑"),
];

fn pin_action(current: Option<&Tab>) -> Item {
    let item = if current.is_some_and(|t| t.pinned) {
        Item::static_action("Unpin tab", "Unpin the current tab", ActionTag::Unpin)
    } else {
        Item::static_action("Pin tab", "Pin the current tab", ActionTag::Pin)
    };
    item.with_emoji("📌").with_keys(&["⌥", "⇧", "P"])
}

fn mute_action(current: Option<&Tab>) -> Item {
    let item = if current.is_some_and(|t| t.is_muted()) {
        Item::static_action("Unmute tab", "Unmute the current tab", ActionTag::Unmute)
            .with_emoji("🔈")
    } else {
        Item::static_action("Mute tab", "Mute the current tab", ActionTag::Mute).with_emoji("🔇")
    };
    item.with_keys(&["⌥", "⇧", "M"])
}

/// The built-in actions, with key bindings in their macOS form.
///
/// Pin and mute entries reflect the state of `current`, the tab the palette
/// was opened on.
pub fn static_actions(current: Option<&Tab>) -> Vec<Item> {
    let mut actions = vec![
        Item::static_action("New tab", "Open a new tab", ActionTag::NewTab)
            .with_emoji("✨")
            .with_keys(&["⌘", "T"]),
        Item::static_action("Bookmark", "Create a bookmark", ActionTag::CreateBookmark)
            .with_emoji("📕")
            .with_keys(&["⌘", "D"]),
        pin_action(current),
        Item::static_action("Fullscreen", "Make the page fullscreen", ActionTag::Fullscreen)
            .with_emoji("🖥")
            .with_keys(&["⌘", "Ctrl", "F"]),
        mute_action(current),
        Item::static_action("Reload", "Reload the page", ActionTag::Reload)
            .with_emoji("♻️")
            .with_keys(&["⌘", "⇧", "R"]),
        Item::static_action("Compose email", "Compose a new email", ActionTag::Email)
            .with_emoji("✉️")
            .with_keys(&["⌥", "⇧", "C"]),
    ];

    actions.extend(CREATE_LINKS.iter().map(|(title, desc, url, emoji)| {
        let item = Item::url_action(title, desc, url);
        match emoji {
            Some(e) => item.with_emoji(e),
            None => item,
        }
    }));

    actions.extend([
        Item::static_action("Browsing history", "Browse through your browsing history", ActionTag::History)
            .with_emoji("🗂")
            .with_keys(&["⌘", "Y"]),
        Item::static_action("Incognito mode", "Open an incognito window", ActionTag::Incognito)
            .with_emoji("🕵️")
            .with_keys(&["⌘", "⇧", "N"]),
        Item::static_action("Downloads", "Browse through your downloads", ActionTag::Downloads)
            .with_emoji("📦")
            .with_keys(&["⌘", "⇧", "J"]),
        Item::static_action("Extensions", "Manage your Chrome Extensions", ActionTag::Extensions)
            .with_emoji("🧩"),
        Item::static_action("Chrome settings", "Open the Chrome settings", ActionTag::Settings)
            .with_emoji("⚙️")
            .with_keys(&["⌘", ","]),
        Item::static_action("Scroll to bottom", "Scroll to the bottom of the page", ActionTag::ScrollBottom)
            .with_emoji("👇")
            .with_keys(&["⌘", "↓"]),
        Item::static_action("Scroll to top", "Scroll to the top of the page", ActionTag::ScrollTop)
            .with_emoji("👆")
            .with_keys(&["⌘", "↑"]),
        Item::static_action("Go back", "Go back in history for the current tab", ActionTag::GoBack)
            .with_emoji("👈")
            .with_keys(&["⌘", "←"]),
        Item::static_action("Go forward", "Go forward in history for the current tab", ActionTag::GoForward)
            .with_emoji("👉")
            .with_keys(&["⌘", "→"]),
        Item::static_action("Duplicate tab", "Make a copy of the current tab", ActionTag::DuplicateTab)
            .with_emoji("📋")
            .with_keys(&["⌥", "⇧", "D"]),
        Item::static_action("Close tab", "Close the current tab", ActionTag::CloseTab)
            .with_emoji("🗑")
            .with_keys(&["⌘", "W"]),
        Item::static_action("Close window", "Close the current window", ActionTag::CloseWindow)
            .with_emoji("💥")
            .with_keys(&["⌘", "⇧", "W"]),
        Item::static_action("Manage browsing data", "Manage your browsing data", ActionTag::ManageData)
            .with_emoji("🔬")
            .with_keys(&["⌘", "⇧", "Delete"]),
    ]);

    actions.extend(CLEAR_DATA.iter().map(|(title, desc, tag, emoji)| {
        Item::static_action(title, desc, *tag)
            .with_emoji(emoji)
            .with_permission(BROWSING_DATA_PERMISSION)
    }));

    actions.push(Item::static_action("Options", "Omni Launcher options", ActionTag::Options));
    actions
}

/// Summary row prepended to the tab list when duplicates exist.
pub fn remove_duplicates_action(count: usize) -> Item {
    let label = format!("Remove {count} duplicate tabs");
    Item::static_action(&label, &label, ActionTag::RemoveDuplicateTabs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_and_mute_follow_current_tab() {
        let mut tab = Tab::new(1, 1, "https://a.com");
        tab.pinned = true;
        tab.muted_info.muted = true;
        let actions = static_actions(Some(&tab));
        assert!(actions.iter().any(|a| a.action_tag() == Some(ActionTag::Unpin)));
        assert!(actions.iter().any(|a| a.action_tag() == Some(ActionTag::Unmute)));
        assert!(!actions.iter().any(|a| a.action_tag() == Some(ActionTag::Pin)));

        let defaults = static_actions(None);
        assert!(defaults.iter().any(|a| a.title == "Pin tab"));
        assert!(defaults.iter().any(|a| a.title == "Mute tab"));
    }

    #[test]
    fn clear_data_actions_require_permission() {
        let gated: Vec<_> = static_actions(None)
            .into_iter()
            .filter(|a| a.has_permission().is_some())
            .collect();
        assert_eq!(gated.len(), CLEAR_DATA.len());
        assert!(gated.iter().all(|a| a.has_permission() == Some(false)));
    }
}

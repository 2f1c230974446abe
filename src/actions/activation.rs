use super::{ActionTag, Item, ItemKind};
use crate::duplicates::DuplicateGroup;
use crate::filter::Scope;
use crate::sources::Tab;

/// Modifier keys held when an item was activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// What the execution layer should do for an activated item.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    GrantPermission(String),
    RemoveTab(i64),
    RemoveBookmark(String),
    EnterScope(String),
    SwitchTab(Tab),
    OpenUrl { url: String, new_tab: bool },
    Execute(ActionTag),
    /// Duplicate groups to show for confirmation before anything is closed.
    ReviewDuplicates(Vec<DuplicateGroup>),
}

pub fn resolve_activation(item: &Item, scope: Scope, modifiers: Modifiers) -> Activation {
    if let ItemKind::StaticAction {
        permission: Some(p),
        ..
    } = &item.kind
    {
        if !p.granted {
            return Activation::GrantPermission(p.name.clone());
        }
    }

    if scope == Scope::Remove {
        match &item.kind {
            ItemKind::Tab { tab, .. } => return Activation::RemoveTab(tab.id),
            ItemKind::Bookmark { .. } => {
                if let Some(id) = &item.id {
                    return Activation::RemoveBookmark(id.clone());
                }
            }
            _ => {}
        }
    }

    match &item.kind {
        ItemKind::Command { search_prefix, .. } => Activation::EnterScope(search_prefix.clone()),
        ItemKind::Tab { tab, .. } => Activation::SwitchTab(tab.clone()),
        ItemKind::Bookmark { url } | ItemKind::History { url } => Activation::OpenUrl {
            url: url.clone(),
            new_tab: modifiers.meta,
        },
        ItemKind::StaticAction {
            url: Some(url), ..
        } => Activation::OpenUrl {
            url: url.clone(),
            new_tab: modifiers.meta,
        },
        ItemKind::StaticAction { action, .. } => Activation::Execute(*action),
        ItemKind::CustomSearch { .. } => Activation::Execute(ActionTag::CustomSearch),
    }
}

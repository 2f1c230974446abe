//! Keyboard selection over the filtered list, as a pure reducer.

use crate::actions::activation::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    /// Any key the palette does not handle.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A new list arrived (new query or refresh).
    Replaced { count: usize },
    /// The current list changed length without being replaced.
    Resized { count: usize },
    Key { key: Key, modifiers: Modifiers },
    Hover { index: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The host should suppress the key's default behaviour.
    pub prevent_default: bool,
    /// Index and modifiers of an activated item.
    pub activate: Option<(usize, Modifiers)>,
    pub close: bool,
}

impl Selection {
    pub fn new(count: usize) -> Self {
        Self { index: 0, count }
    }

    fn last(&self) -> usize {
        self.count.saturating_sub(1)
    }

    pub fn reduce(self, event: SelectionEvent) -> (Selection, Outcome) {
        let handled = Outcome {
            prevent_default: true,
            ..Outcome::default()
        };
        match event {
            SelectionEvent::Replaced { count } => (Selection { index: 0, count }, Outcome::default()),
            SelectionEvent::Resized { count } => (
                Selection {
                    index: self.index.min(count.saturating_sub(1)),
                    count,
                },
                Outcome::default(),
            ),
            SelectionEvent::Hover { index } => (
                Selection {
                    index: index.min(self.last()),
                    ..self
                },
                Outcome::default(),
            ),
            SelectionEvent::Key { key, modifiers } => match key {
                Key::ArrowUp => (
                    Selection {
                        index: self.index.saturating_sub(1),
                        ..self
                    },
                    handled,
                ),
                Key::ArrowDown => (
                    Selection {
                        index: (self.index + 1).min(self.last()),
                        ..self
                    },
                    handled,
                ),
                Key::Enter => {
                    let activate = (self.count > 0).then_some((self.index, modifiers));
                    (self, Outcome { activate, ..handled })
                }
                Key::Escape => (self, Outcome { close: true, ..handled }),
                Key::Other => (self, Outcome::default()),
            },
        }
    }

    /// Reduce in place, returning the outcome.
    pub fn apply(&mut self, event: SelectionEvent) -> Outcome {
        let (next, outcome) = self.reduce(event);
        *self = next;
        outcome
    }
}

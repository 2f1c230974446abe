use omni_launcher::actions::activation::Modifiers;
use omni_launcher::selection::{Key, Selection, SelectionEvent};

fn press(sel: &mut Selection, key: Key) -> omni_launcher::selection::Outcome {
    sel.apply(SelectionEvent::Key {
        key,
        modifiers: Modifiers::default(),
    })
}

#[test]
fn list_shrinking_from_five_to_two_clamps_index() {
    let mut sel = Selection::new(5);
    for _ in 0..4 {
        press(&mut sel, Key::ArrowDown);
    }
    assert_eq!(sel.index, 4);
    sel.apply(SelectionEvent::Resized { count: 2 });
    assert_eq!(sel.index, 1);
}

#[test]
fn navigation_keys_are_intercepted() {
    let mut sel = Selection::new(2);
    for key in [Key::ArrowDown, Key::ArrowUp, Key::Enter, Key::Escape] {
        assert!(press(&mut sel, key).prevent_default);
    }
    assert!(!press(&mut sel, Key::Other).prevent_default);
}

#[test]
fn enter_activates_hovered_item() {
    let mut sel = Selection::new(4);
    sel.apply(SelectionEvent::Hover { index: 3 });
    let out = press(&mut sel, Key::Enter);
    assert_eq!(out.activate.map(|(i, _)| i), Some(3));
}

#[test]
fn escape_requests_close() {
    let mut sel = Selection::new(1);
    assert!(press(&mut sel, Key::Escape).close);
}

// ── Selection manager ──
//
// Reconciles a list screen's row selection with the item being edited.
// Three inputs (route item id, visible rows, selected rows) are fed
// through setters; each setter returns the navigation events it caused.
// Loaded ids are optional: once known, they gate the first-load auto-go
// and close the editor when its item disappears. Events are
// distinct-until-changed across both kinds.

use crate::model::{EntityId, ItemRef};

/// Navigation requested by the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Open the editor on this item.
    EditGoes(EntityId),
    /// Close the editor.
    EditLeaves,
}

#[derive(Debug, Default)]
pub struct SelectionManager {
    item_id: Option<ItemRef>,
    visible_rows: Vec<EntityId>,
    selected_rows: Vec<EntityId>,
    /// `None` until the list reports what it loaded.
    loaded_items: Option<Vec<EntityId>>,
    last: Option<SelectionEvent>,
    auto_go_done: bool,
    /// Selection captured when the route id last cleared.
    snapshot: Vec<EntityId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The route's item id changed.
    ///
    /// Navigation the route already reflects is recorded as the last
    /// transition so the selection does not re-request it.
    pub fn set_item_id(&mut self, item_id: Option<ItemRef>) -> Vec<SelectionEvent> {
        match &item_id {
            Some(ItemRef::Existing(id)) => self.last = Some(SelectionEvent::EditGoes(id.clone())),
            Some(ItemRef::New) => self.last = None,
            None => {
                self.snapshot = self.selected_rows.clone();
                self.last = Some(SelectionEvent::EditLeaves);
            }
        }
        self.item_id = item_id;
        Vec::new()
    }

    /// Rows left after filtering. The first time exactly one row is
    /// visible, nothing is filtered out and no item is open, that row is
    /// opened. Without loaded ids, every visible row counts as loaded.
    pub fn set_visible_rows(&mut self, rows: Vec<EntityId>) -> Vec<SelectionEvent> {
        self.visible_rows = rows;
        let unfiltered = self
            .loaded_items
            .as_ref()
            .is_none_or(|loaded| loaded.len() == self.visible_rows.len());
        if self.auto_go_done
            || self.item_id.is_some()
            || self.visible_rows.len() != 1
            || !unfiltered
        {
            return Vec::new();
        }
        self.auto_go_done = true;
        let id = self.visible_rows[0].clone();
        self.transition(SelectionEvent::EditGoes(id))
    }

    pub fn set_selected_rows(&mut self, rows: Vec<EntityId>) -> Vec<SelectionEvent> {
        self.selected_rows = rows;
        match self.selected_rows.as_slice() {
            [id] => {
                let id = id.clone();
                self.transition(SelectionEvent::EditGoes(id))
            }
            _ => self.transition(SelectionEvent::EditLeaves),
        }
    }

    /// The list was (re)loaded. Leaves the editor if its item is gone.
    pub fn set_loaded_items(&mut self, ids: Vec<EntityId>) -> Vec<SelectionEvent> {
        let edited_gone = matches!(
            &self.last,
            Some(SelectionEvent::EditGoes(id)) if !ids.contains(id)
        );
        self.loaded_items = Some(ids);
        if edited_gone {
            self.transition(SelectionEvent::EditLeaves)
        } else {
            Vec::new()
        }
    }

    /// Ids the checkboxes should show as selected.
    pub fn selected_item_ids(&self) -> Vec<EntityId> {
        match &self.item_id {
            Some(ItemRef::Existing(id)) => vec![id.clone()],
            Some(ItemRef::New) => Vec::new(),
            None => self.snapshot.clone(),
        }
    }

    pub fn visible_rows(&self) -> &[EntityId] {
        &self.visible_rows
    }

    fn transition(&mut self, event: SelectionEvent) -> Vec<SelectionEvent> {
        if self.last.as_ref() == Some(&event) {
            return Vec::new();
        }
        self.last = Some(event.clone());
        vec![event]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|&s| EntityId::from(s)).collect()
    }

    fn goes(id: &str) -> SelectionEvent {
        SelectionEvent::EditGoes(id.into())
    }

    #[test]
    fn single_selection_goes_once() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["a", "b"]));
        assert_eq!(m.set_selected_rows(ids(&["a"])), vec![goes("a")]);
        assert!(m.set_selected_rows(ids(&["a"])).is_empty());
        assert_eq!(m.set_selected_rows(ids(&["b"])), vec![goes("b")]);
    }

    #[test]
    fn none_or_multiple_leaves_once() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["a", "b"]));
        m.set_selected_rows(ids(&["a"]));
        assert_eq!(m.set_selected_rows(ids(&["a", "b"])), vec![SelectionEvent::EditLeaves]);
        assert!(m.set_selected_rows(Vec::new()).is_empty());
    }

    #[test]
    fn single_selection_goes_without_loaded_ids() {
        let mut m = SelectionManager::new();
        assert_eq!(m.set_selected_rows(ids(&["a"])), vec![goes("a")]);
        assert_eq!(m.set_selected_rows(Vec::new()), vec![SelectionEvent::EditLeaves]);
    }

    #[test]
    fn auto_go_with_visible_rows_only() {
        let mut m = SelectionManager::new();
        assert_eq!(m.set_visible_rows(ids(&["only"])), vec![goes("only")]);
        assert!(m.set_visible_rows(ids(&["only"])).is_empty());

        let mut many = SelectionManager::new();
        assert!(many.set_visible_rows(ids(&["a", "b"])).is_empty());
    }

    #[test]
    fn auto_go_on_first_load_with_one_row() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["only"]));
        assert_eq!(m.set_visible_rows(ids(&["only"])), vec![goes("only")]);
        // Once per manager.
        m.set_selected_rows(Vec::new());
        assert!(m.set_visible_rows(ids(&["only"])).is_empty());
    }

    #[test]
    fn no_auto_go_when_filtered_or_routed() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["a", "b"]));
        assert!(m.set_visible_rows(ids(&["a"])).is_empty());

        let mut routed = SelectionManager::new();
        routed.set_item_id(Some(ItemRef::New));
        routed.set_loaded_items(ids(&["a"]));
        assert!(routed.set_visible_rows(ids(&["a"])).is_empty());
    }

    #[test]
    fn route_id_is_not_requested_again() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["a", "b"]));
        m.set_item_id(Some(ItemRef::Existing("a".into())));
        assert!(m.set_selected_rows(ids(&["a"])).is_empty());
    }

    #[test]
    fn edited_item_disappearing_leaves() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["a", "b"]));
        m.set_item_id(Some(ItemRef::Existing("a".into())));
        assert_eq!(m.set_loaded_items(ids(&["b"])), vec![SelectionEvent::EditLeaves]);
        assert!(m.set_loaded_items(ids(&["b"])).is_empty());
    }

    #[test]
    fn route_id_drives_selected_ids() {
        let mut m = SelectionManager::new();
        m.set_loaded_items(ids(&["a", "b"]));
        m.set_item_id(Some(ItemRef::Existing("a".into())));
        assert_eq!(m.selected_item_ids(), ids(&["a"]));

        m.set_item_id(Some(ItemRef::New));
        assert!(m.selected_item_ids().is_empty());

        m.set_selected_rows(ids(&["a", "b"]));
        m.set_item_id(None);
        assert_eq!(m.selected_item_ids(), ids(&["a", "b"]));
    }
}

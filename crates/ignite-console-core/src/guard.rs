// ── Unsaved-changes guard ──
//
// Decides whether leaving an edited entity may discard its changes. Both
// sides are normalized before comparison; on a real difference the user
// is asked through the `Confirm` hook.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CoreError;

pub const DISCARD_CHANGES_PROMPT: &str =
    "You have unsaved changes. Are you sure you want to discard them?";

/// A yes/no question put to the user.
///
/// Implementations may block (a terminal prompt); callers in async code
/// run them on a blocking thread.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> Result<bool, CoreError>;
}

/// Answers every question the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _message: &str) -> Result<bool, CoreError> {
        Ok(self.0)
    }
}

/// Strip bookkeeping that never counts as a change: `__v`, keys starting
/// with `__` or `$$`, and nulls inside objects.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, v)| !(k.starts_with("__") || k.starts_with("$$") || v.is_null()))
                .map(|(k, v)| (k, normalize(v)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

#[derive(Clone)]
pub struct ConfigChangesGuard {
    confirm: Arc<dyn Confirm>,
}

impl ConfigChangesGuard {
    pub fn new(confirm: Arc<dyn Confirm>) -> Self {
        Self { confirm }
    }

    /// `true` if it is fine to move on.
    pub fn guard(&self, persisted: Option<&Value>, edited: Option<&Value>) -> bool {
        if persisted.is_none() && edited.is_none() {
            return true;
        }
        let persisted = persisted.cloned().map(normalize);
        let edited = edited.cloned().map(normalize);
        if persisted == edited {
            return true;
        }
        debug!("unsaved changes detected, asking for confirmation");
        self.confirm.confirm(DISCARD_CHANGES_PROMPT).unwrap_or(false)
    }
}

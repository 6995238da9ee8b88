//! EditSession: the at-most-one "currently editing record X" state machine.
//!
//! ```text
//!   Idle --start--> Editing --cancel--------------> Idle
//!                   Editing --set_field-----------> Editing
//!                   Editing --begin_save (dirty)--> Editing(saving)
//!                   Editing(saving) --ack---------> Idle
//!                   Editing(saving) --failure-----> Editing(error)
//!                   Editing(saving) --interrupt---> Editing(error)
//! ```
//!
//! The session owns its `pristine` and `working` copies outright; nothing is
//! shared with the mirror. Dirtiness is full structural inequality of the
//! two records, not per-field tracking: the save gate only needs a boolean.

use crate::{
    error::EditError,
    schema::EntitySchema,
    types::{FieldValue, Key, Record},
};

/// The record under edit and its two copies.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEdit {
    pub target: Key,
    /// Latest known remote value; baseline for dirtiness.
    pub pristine: Record,
    /// The user's in-progress copy.
    pub working: Record,
    /// A save for this session is waiting on the store.
    pub saving: bool,
    /// Reason the last save attempt failed, if it did.
    pub error: Option<String>,
}

impl ActiveEdit {
    pub fn is_dirty(&self) -> bool {
        self.working != self.pristine
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing(ActiveEdit),
}

/// What a remote snapshot did to the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// No session is active.
    Idle,
    /// The remote record equals `pristine`; nothing changed.
    Unchanged,
    /// `pristine` was refreshed to the new remote value; `working` untouched.
    Rebased(Key),
    /// The record is gone from the remote collection; the session was closed.
    Abandoned(Key),
}

#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveEdit> {
        match &self.state {
            EditState::Idle => None,
            EditState::Editing(edit) => Some(edit),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    pub fn target(&self) -> Option<&Key> {
        self.active().map(|e| &e.target)
    }

    pub fn is_dirty(&self) -> bool {
        self.active().map(ActiveEdit::is_dirty).unwrap_or(false)
    }

    pub fn is_saving(&self) -> bool {
        self.active().map(|e| e.saving).unwrap_or(false)
    }

    /// `Idle → Editing(key)`. Rejected while another session is active; the
    /// active session is left exactly as it was.
    pub fn start(&mut self, key: Key, current: &Record) -> Result<(), EditError> {
        if let EditState::Editing(edit) = &self.state {
            return Err(EditError::AlreadyEditing {
                target: edit.target.clone(),
            });
        }
        self.state = EditState::Editing(ActiveEdit {
            target: key,
            pristine: current.clone(),
            working: current.clone(),
            saving: false,
            error: None,
        });
        Ok(())
    }

    /// Write one field of `working`, coerced through the schema.
    ///
    /// No value validation happens here; that is deferred to save. Unknown
    /// field names are rejected so `working` stays comparable to `pristine`.
    pub fn set_field(
        &mut self,
        schema: &EntitySchema,
        field: &str,
        value: FieldValue,
    ) -> Result<(), EditError> {
        let edit = self.editing_mut()?;
        if edit.saving {
            return Err(EditError::SaveInFlight {
                target: edit.target.clone(),
            });
        }
        let value = schema.coerce(field, value)?;
        edit.working.set(field, value);
        Ok(())
    }

    /// `Editing → Idle`, discarding `working`. Returns the released key.
    pub fn cancel(&mut self) -> Result<Key, EditError> {
        let edit = self.editing_mut()?;
        if edit.saving {
            return Err(EditError::SaveInFlight {
                target: edit.target.clone(),
            });
        }
        let key = edit.target.clone();
        self.state = EditState::Idle;
        Ok(key)
    }

    /// Check the dirtiness gate and mark the session as saving.
    ///
    /// Returns the key and a copy of `working` to write.
    pub fn begin_save(&mut self) -> Result<(Key, Record), EditError> {
        let edit = self.editing_mut()?;
        if edit.saving {
            return Err(EditError::SaveInFlight {
                target: edit.target.clone(),
            });
        }
        if !edit.is_dirty() {
            return Err(EditError::NotDirty);
        }
        edit.saving = true;
        edit.error = None;
        Ok((edit.target.clone(), edit.working.clone()))
    }

    /// Resolve a save started by [`begin_save`](Self::begin_save).
    ///
    /// On success the session closes and `true` is returned. On failure the
    /// session stays open with `working` and `pristine` exactly as they were
    /// and the reason recorded. Outcomes for a session that no longer exists
    /// (abandoned mid-save) are ignored.
    pub fn finish_save(&mut self, key: &Key, outcome: Result<(), String>) -> bool {
        let EditState::Editing(edit) = &mut self.state else {
            return false;
        };
        if &edit.target != key || !edit.saving {
            return false;
        }
        match outcome {
            Ok(()) => {
                self.state = EditState::Idle;
                true
            }
            Err(reason) => {
                edit.saving = false;
                edit.error = Some(reason);
                false
            }
        }
    }

    /// Give up on a save whose write will never resolve, as when the save
    /// future is dropped mid-flight. The session reopens with its edits and
    /// `reason` recorded. Returns `false` when no such save is running.
    pub fn interrupt_save(&mut self, key: &Key, reason: impl Into<String>) -> bool {
        match &mut self.state {
            EditState::Editing(edit) if &edit.target == key && edit.saving => {
                edit.saving = false;
                edit.error = Some(reason.into());
                true
            }
            _ => false,
        }
    }

    /// Reconcile the session with the remote value of its target.
    ///
    /// Only `pristine` ever follows the remote side; `working` is never
    /// overwritten by a snapshot.
    pub fn rebase(&mut self, remote: Option<&Record>) -> RebaseOutcome {
        let EditState::Editing(edit) = &mut self.state else {
            return RebaseOutcome::Idle;
        };
        match remote {
            None => {
                let key = edit.target.clone();
                self.state = EditState::Idle;
                RebaseOutcome::Abandoned(key)
            }
            Some(record) if *record == edit.pristine => RebaseOutcome::Unchanged,
            Some(record) => {
                edit.pristine = record.clone();
                RebaseOutcome::Rebased(edit.target.clone())
            }
        }
    }

    fn editing_mut(&mut self) -> Result<&mut ActiveEdit, EditError> {
        match &mut self.state {
            EditState::Idle => Err(EditError::NotEditing),
            EditState::Editing(edit) => Ok(edit),
        }
    }
}

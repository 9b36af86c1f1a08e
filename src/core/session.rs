//! Investigation sessions
//!
//! A [`SessionContext`] bundles everything one survey session owns: its
//! metadata, the value store and the auto-save state. It is passed
//! explicitly to whatever needs it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::autosave::{AutoSave, AutosaveOutcome};
use crate::core::identity::RowId;
use crate::core::key::{ContextId, FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;
use crate::entities::checklist::{ChecklistRow, ChecklistTable};
use crate::persist::{PersistError, PersistenceAdapter, SaveReceipt};

/// Characters that may not appear in a session id (it doubles as a file stem)
const ID_FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Build a session id: `<workplace>_<YYYYmmdd_HHMMSS>`, optionally followed
/// by a random `_<4 hex>` suffix
pub fn generate_session_id(workplace: &str, now: NaiveDateTime, with_suffix: bool) -> String {
    let stem: String = workplace
        .trim()
        .chars()
        .map(|c| if ID_FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let mut id = format!("{}_{}", stem, now.format("%Y%m%d_%H%M%S"));
    if with_suffix {
        id.push_str(&format!("_{:04x}", rand::random::<u16>()));
    }
    id
}

/// Identity of a saved or in-progress session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub session_id: String,
    pub workplace: String,
    #[serde(default)]
    pub saved_at: Option<NaiveDateTime>,
}

impl SessionMeta {
    pub fn new(session_id: impl Into<String>, workplace: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            workplace: workplace.into(),
            saved_at: None,
        }
    }
}

/// One entry of a session listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub workplace: String,
    pub saved_at: Option<NaiveDateTime>,
    /// Where the session lives (file path or database path)
    pub location: String,
}

/// Rows removed from the checklist, plus the unit contexts purged with them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub rows: Vec<ChecklistRow>,
    pub purged_units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub meta: SessionMeta,
    pub store: ValueStore,
    pub autosave: AutoSave,
}

impl SessionContext {
    /// Start a new session for `workplace`
    pub fn start(
        workplace: &str,
        now: NaiveDateTime,
        with_suffix: bool,
    ) -> Result<Self, ValidationWarning> {
        let workplace = workplace.trim();
        if workplace.is_empty() {
            return Err(ValidationWarning::MissingWorkplace);
        }

        let mut store = ValueStore::new();
        store.set_scalar(ValueKey::global(FieldId::WorkplaceName), workplace);

        let meta = SessionMeta::new(generate_session_id(workplace, now, with_suffix), workplace);
        tracing::info!(session = %meta.session_id, "started session");
        Ok(Self {
            meta,
            store,
            autosave: AutoSave::default(),
        })
    }

    /// Resume a session from a loaded store
    pub fn resume(meta: SessionMeta, store: ValueStore, autosave: AutoSave) -> Self {
        Self {
            meta,
            store,
            autosave,
        }
    }

    /// Remove checklist rows, purging the value contexts of units that no
    /// longer have any row
    pub fn remove_rows(&mut self, ids: &[RowId]) -> Result<Removal, ValidationWarning> {
        if let Some(missing) = ids.iter().find(|id| self.store.checklist.get(**id).is_none()) {
            return Err(ValidationWarning::UnknownRow(*missing));
        }
        let units_before = self.store.checklist.units();
        let rows = self.store.checklist.remove(ids);
        let purged_units = self.purge_orphans(&units_before);
        Ok(Removal { rows, purged_units })
    }

    /// Merge rows into one renamed task
    ///
    /// Values keyed by the unit stay in place: the merged row keeps the
    /// template's unit.
    pub fn merge_rows(&mut self, ids: &[RowId], new_name: &str) -> Result<RowId, ValidationWarning> {
        let units_before = self.store.checklist.units();
        let id = self.store.checklist.merge(ids, new_name)?;
        self.purge_orphans(&units_before);
        Ok(id)
    }

    /// Edit one checklist row in place; a unit left without rows by the
    /// edit has its values purged
    pub fn edit_row<F>(&mut self, id: RowId, edit: F) -> Result<Vec<String>, ValidationWarning>
    where
        F: FnOnce(&mut ChecklistRow),
    {
        let units_before = self.store.checklist.units();
        let row = self
            .store
            .checklist
            .get_mut(id)
            .ok_or(ValidationWarning::UnknownRow(id))?;
        edit(row);
        Ok(self.purge_orphans(&units_before))
    }

    /// Swap in a whole new checklist (an upload or the sample template)
    pub fn replace_checklist(&mut self, checklist: ChecklistTable) -> Vec<String> {
        let units_before = self.store.checklist.units();
        self.store.checklist = checklist;
        self.purge_orphans(&units_before)
    }

    fn purge_orphans(&mut self, units_before: &[String]) -> Vec<String> {
        let units_after = self.store.checklist.units();
        let mut purged = Vec::new();
        for unit in units_before.iter().filter(|u| !units_after.contains(u)) {
            let removed = self.store.remove_context(&ContextId::unit(unit.as_str()));
            tracing::debug!(unit = %unit, removed, "purged orphaned unit values");
            purged.push(unit.clone());
        }
        purged
    }

    /// Save now, updating the metadata and auto-save markers
    pub fn save(
        &mut self,
        adapter: &dyn PersistenceAdapter,
        now: NaiveDateTime,
    ) -> Result<SaveReceipt, PersistError> {
        let mut meta = self.meta.clone();
        meta.saved_at = Some(now);
        let receipt = adapter.save(&meta, &self.store)?;
        self.meta = meta;
        self.autosave.record_success(now);
        Ok(receipt)
    }

    /// Run the auto-save check for one interaction cycle
    pub fn interaction_cycle(
        &mut self,
        adapter: &dyn PersistenceAdapter,
        now: NaiveDateTime,
    ) -> AutosaveOutcome {
        let mut meta = self.meta.clone();
        meta.saved_at = Some(now);
        let store = &self.store;
        let outcome = self
            .autosave
            .tick(now, true, || adapter.save(&meta, store).map(|_| ()));

        match &outcome {
            AutosaveOutcome::Saved(at) => {
                self.meta.saved_at = Some(*at);
                tracing::info!(session = %self.meta.session_id, "auto-saved");
            }
            AutosaveOutcome::Failed(reason) => {
                tracing::warn!(session = %self.meta.session_id, %reason, "auto-save failed");
            }
            _ => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::CriterionState;
    use crate::persist::LoadOutcome;
    use chrono::{NaiveDate, TimeDelta};
    use std::cell::RefCell;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            + TimeDelta::seconds(secs)
    }

    /// Adapter that records saves in memory and can be told to fail
    #[derive(Default)]
    struct MemoryAdapter {
        saved: RefCell<Vec<(SessionMeta, ValueStore)>>,
        fail: bool,
    }

    impl PersistenceAdapter for MemoryAdapter {
        fn save(&self, meta: &SessionMeta, store: &ValueStore) -> Result<SaveReceipt, PersistError> {
            if self.fail {
                return Err(PersistError::Save {
                    location: "memory".into(),
                    reason: "refused".into(),
                });
            }
            self.saved.borrow_mut().push((meta.clone(), store.clone()));
            Ok(SaveReceipt {
                location: "memory".into(),
                saved_at: meta.saved_at.unwrap_or_default(),
                backup: None,
            })
        }

        fn load(&self, id: &str) -> Result<LoadOutcome, PersistError> {
            Err(PersistError::NotFound(id.to_string()))
        }

        fn list(&self) -> Result<Vec<SessionSummary>, PersistError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_session_id_format() {
        assert_eq!(generate_session_id("A사업장", at(0), false), "A사업장_20240501_143000");
        let suffixed = generate_session_id("A사업장", at(0), true);
        let suffix = suffixed.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_id_strips_path_separators() {
        assert_eq!(generate_session_id("A/B", at(0), false), "A_B_20240501_143000");
    }

    #[test]
    fn test_start_requires_workplace() {
        assert_eq!(
            SessionContext::start("  ", at(0), false),
            Err(ValidationWarning::MissingWorkplace)
        );
        let ctx = SessionContext::start("A사업장", at(0), false).unwrap();
        assert_eq!(ctx.store.global_text(FieldId::WorkplaceName), "A사업장");
    }

    #[test]
    fn test_remove_rows_purges_orphaned_units() {
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        let keep = ctx.store.checklist.push(ChecklistRow::new("A", "d", "u1", "t1"));
        let gone = ctx.store.checklist.push(ChecklistRow::new("A", "d", "u2", "t2"));
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "u1"), "x");
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "u2"), "y");

        let removal = ctx.remove_rows(&[gone]).unwrap();
        assert_eq!(removal.rows.len(), 1);
        assert_eq!(removal.purged_units, vec!["u2"]);
        assert_eq!(ctx.store.text(&ValueKey::unit(FieldId::Surveyor, "u1")), "x");
        assert!(!ctx.store.contains(&ValueKey::unit(FieldId::Surveyor, "u2")));
        assert!(ctx.store.checklist.get(keep).is_some());
    }

    #[test]
    fn test_remove_unknown_row_leaves_state_unchanged() {
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        ctx.store.checklist = ChecklistTable::sample();
        let before = ctx.clone();
        assert!(ctx.remove_rows(&[RowId::new()]).is_err());
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_merge_rows_keeps_unit_values() {
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        let a = ctx
            .store
            .checklist
            .push(ChecklistRow::new("A", "d", "u", "t1").with_criterion(1, CriterionState::Applicable));
        let b = ctx.store.checklist.push(ChecklistRow::new("A", "d", "u", "t2"));
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "u"), "x");

        let merged = ctx.merge_rows(&[a, b], "통합").unwrap();
        assert_eq!(ctx.store.checklist.get(merged).unwrap().task_name, "통합");
        assert_eq!(ctx.store.text(&ValueKey::unit(FieldId::Surveyor, "u")), "x");
    }

    #[test]
    fn test_renaming_a_unit_purges_its_values() {
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        let id = ctx.store.checklist.push(ChecklistRow::new("A", "d", "old", "t"));
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "old"), "x");

        let purged = ctx.edit_row(id, |row| row.unit = "new".into()).unwrap();
        assert_eq!(purged, vec!["old"]);
        assert!(!ctx.store.contains(&ValueKey::unit(FieldId::Surveyor, "old")));
        assert!(ctx.edit_row(RowId::new(), |_| {}).is_err());
    }

    #[test]
    fn test_replace_checklist_keeps_surviving_units() {
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        ctx.store.checklist = ChecklistTable::sample();
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "포장반"), "x");
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "검사1반"), "y");

        let replacement = ChecklistTable::from_rows(vec![ChecklistRow::new("A", "d", "포장반", "t")]);
        let purged = ctx.replace_checklist(replacement);
        assert_eq!(purged.len(), 3);
        assert_eq!(ctx.store.text(&ValueKey::unit(FieldId::Surveyor, "포장반")), "x");
        assert!(!ctx.store.contains(&ValueKey::unit(FieldId::Surveyor, "검사1반")));
    }

    #[test]
    fn test_explicit_save_updates_markers() {
        let adapter = MemoryAdapter::default();
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        ctx.save(&adapter, at(5)).unwrap();
        assert_eq!(ctx.meta.saved_at, Some(at(5)));
        assert_eq!(ctx.autosave.last_success(), Some(at(5)));
        assert_eq!(adapter.saved.borrow().len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_previous_meta() {
        let adapter = MemoryAdapter {
            fail: true,
            ..Default::default()
        };
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();
        assert!(ctx.save(&adapter, at(5)).is_err());
        assert_eq!(ctx.meta.saved_at, None);
    }

    #[test]
    fn test_interaction_cycle_saves_after_threshold() {
        let adapter = MemoryAdapter::default();
        let mut ctx = SessionContext::start("A", at(0), false).unwrap();

        assert_eq!(ctx.interaction_cycle(&adapter, at(0)), AutosaveOutcome::Armed);
        assert_eq!(ctx.interaction_cycle(&adapter, at(10)), AutosaveOutcome::NotDue);
        assert_eq!(ctx.interaction_cycle(&adapter, at(31)), AutosaveOutcome::Saved(at(31)));

        let saved = adapter.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0.saved_at, Some(at(31)));
    }
}

use crate::core::form::{is_known_field, Step};
use crate::core::io::{load_json, save_json, KeyValueStore};
use crate::core::state::{FieldValue, FormData};
use crate::services::view::FormView;
use std::sync::Arc;

pub const FORM_DATA_KEY: &str = "indictmentFormData";

/// Accumulates field values across steps and mirrors them to the durable store.
pub struct FormStore {
    data: FormData,
    store: Arc<dyn KeyValueStore>,
}

impl FormStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            data: FormData::new(),
            store,
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.data.get(id)
    }

    /// Snapshots one step's controls. Only truthy values are written, so a
    /// cleared control keeps whatever was captured for it earlier.
    pub fn capture_step(&mut self, view: &dyn FormView, step: Step) {
        let mut written = 0;
        for field in view.fields(Some(step)) {
            if field.value.is_truthy() {
                self.data.insert(field.id, field.value);
                written += 1;
            }
        }
        log::debug!("Captured {} values from {}", written, step);
    }

    /// Live capture of the whole form on every edit. Every control is
    /// written, including empty ones, then the mapping is persisted.
    pub fn capture_all(&mut self, view: &dyn FormView) {
        for field in view.fields(None) {
            self.data.insert(field.id, field.value);
        }
        self.persist();
    }

    /// Best effort: a failing store is logged and otherwise ignored.
    pub fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), FORM_DATA_KEY, &self.data) {
            log::warn!("Failed to persist form data: {:#}", e);
        }
    }

    /// Loads the persisted mapping and pushes each known value back into the
    /// view. Returns how many controls were filled.
    pub fn restore(&mut self, view: &mut dyn FormView) -> usize {
        let Some(saved) = load_json::<FormData>(self.store.as_ref(), FORM_DATA_KEY) else {
            return 0;
        };

        let mut applied = 0;
        for (id, value) in saved {
            if !is_known_field(&id) {
                log::debug!("Ignoring unknown stored field '{}'", id);
                continue;
            }
            if view.set_value(&id, &value) {
                applied += 1;
            }
            self.data.insert(id, value);
        }
        log::info!("Restored {} saved form values", applied);
        applied
    }

    /// Empties the mapping and drops the persisted copy.
    pub fn clear(&mut self) {
        self.data.clear();
        if let Err(e) = self.store.remove(FORM_DATA_KEY) {
            log::warn!("Failed to remove saved form data: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStore;
    use crate::services::view::MemoryFormView;
    use anyhow::{anyhow, Result};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("storage disabled"))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(anyhow!("storage disabled"))
        }
    }

    #[test]
    fn test_capture_step_skips_falsy_and_keeps_old_value() {
        let mut view = MemoryFormView::new();
        view.fill("plaintiffName", "张三").fill("plaintiffPhone", "");

        let mut form = FormStore::new(Arc::new(MemoryStore::new()));
        form.capture_step(&view, Step::CaseAndPlaintiff);
        assert_eq!(form.get("plaintiffName"), Some(&FieldValue::text("张三")));
        assert!(form.get("plaintiffPhone").is_none());

        view.fill("plaintiffName", "");
        form.capture_step(&view, Step::CaseAndPlaintiff);
        assert_eq!(form.get("plaintiffName"), Some(&FieldValue::text("张三")));
    }

    #[test]
    fn test_capture_step_only_reads_that_step() {
        let mut view = MemoryFormView::new();
        view.fill("plaintiffName", "张三").fill("defendantName", "李四");

        let mut form = FormStore::new(Arc::new(MemoryStore::new()));
        form.capture_step(&view, Step::Defendant);
        assert!(form.get("plaintiffName").is_none());
        assert_eq!(form.get("defendantName"), Some(&FieldValue::text("李四")));
    }

    #[test]
    fn test_persist_then_restore_round_trip() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let mut view = MemoryFormView::new();
        view.fill("plaintiffName", "张三")
            .fill("defendantAddress", "B市")
            .check("claimPayment", true)
            .fill("paymentAmount", "5000");

        let mut form = FormStore::new(store.clone());
        form.capture_all(&view);
        let truthy: FormData = form
            .data()
            .iter()
            .filter(|(_, v)| v.is_truthy())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut fresh_view = MemoryFormView::new();
        let mut fresh = FormStore::new(store);
        fresh.restore(&mut fresh_view);

        for (id, value) in &truthy {
            assert_eq!(fresh.get(id), Some(value));
            assert_eq!(fresh_view.value(id), Some(value));
        }
        assert_eq!(truthy.len(), 4);
    }

    #[test]
    fn test_restore_ignores_unknown_keys() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(FORM_DATA_KEY, r#"{"plaintiffName":"张三","favouriteColor":"red"}"#)
            .unwrap();

        let mut view = MemoryFormView::new();
        let mut form = FormStore::new(store);
        assert_eq!(form.restore(&mut view), 1);
        assert!(form.get("favouriteColor").is_none());
    }

    #[test]
    fn test_restore_undefined_string_is_no_data() {
        let store = Arc::new(MemoryStore::new());
        store.set(FORM_DATA_KEY, "undefined").unwrap();

        let mut view = MemoryFormView::new();
        let mut form = FormStore::new(store.clone());
        assert_eq!(form.restore(&mut view), 0);
        assert!(form.data().is_empty());
        assert_eq!(store.get(FORM_DATA_KEY).unwrap(), None);
    }

    #[test]
    fn test_unavailable_storage_does_not_propagate() {
        let mut view = MemoryFormView::new();
        view.fill("plaintiffName", "张三");

        let mut form = FormStore::new(Arc::new(BrokenStore));
        form.capture_all(&view);
        assert_eq!(form.get("plaintiffName"), Some(&FieldValue::text("张三")));
        assert_eq!(form.restore(&mut view), 0);
        form.clear();
        assert!(form.data().is_empty());
    }
}

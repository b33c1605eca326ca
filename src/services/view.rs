//! View binding for the complaint form.
//!
//! The wizard never touches page elements directly; the host hands it an
//! implementation of [`FormView`] (DOM-backed in the browser, in-memory for
//! the terminal front-end and tests).

use crate::core::form::{field_spec, FieldKind, Step, FIELDS};
use crate::core::state::{ClaimType, FieldValue};
use std::collections::{BTreeMap, BTreeSet};

/// One form control as read from the view.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub id: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: FieldValue,
}

impl FormField {
    /// Required fields pass only when the trimmed text is non-empty.
    pub fn is_filled(&self) -> bool {
        match &self.value {
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Flag(b) => *b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMark {
    Completed,
    Active,
    Pending,
}

pub const ERROR_BORDER_COLOR: &str = "#dc2626";
pub const NORMAL_BORDER_COLOR: &str = "#e5e7eb";

/// Inline border colour for a control, marked or not.
pub fn border_color(has_error: bool) -> &'static str {
    if has_error {
        ERROR_BORDER_COLOR
    } else {
        NORMAL_BORDER_COLOR
    }
}

pub trait FormView {
    /// Controls under one step's view, or the whole form for `None`.
    fn fields(&self, step: Option<Step>) -> Vec<FormField>;
    /// Pushes a value into a control. Returns `false` for unknown ids.
    fn set_value(&mut self, id: &str, value: &FieldValue) -> bool;
    fn set_step_visible(&mut self, step: Step, visible: bool);
    fn set_progress(&mut self, step: Step, mark: ProgressMark);
    /// `Some(msg)` shows an inline error and marks the control, `None` clears both.
    fn set_field_error(&mut self, id: &str, message: Option<&str>);
    fn set_sub_input_visible(&mut self, claim: ClaimType, visible: bool);
    fn set_fact_count(&mut self, count: usize);
    fn set_preview(&mut self, text: &str);
    /// Restores every control to its initial value, drops inline errors,
    /// hides claim amounts and zeroes the fact counter.
    fn reset(&mut self);
}

/// [`FormView`] kept entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryFormView {
    values: BTreeMap<String, FieldValue>,
    errors: BTreeMap<String, String>,
    visible: BTreeSet<Step>,
    progress: BTreeMap<Step, ProgressMark>,
    sub_inputs: BTreeSet<String>,
    fact_count: usize,
    preview: Option<String>,
}

impl Default for MemoryFormView {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFormView {
    pub fn new() -> Self {
        Self {
            values: initial_values(),
            errors: BTreeMap::new(),
            visible: BTreeSet::new(),
            progress: BTreeMap::new(),
            sub_inputs: BTreeSet::new(),
            fact_count: 0,
            preview: None,
        }
    }

    /// Test and terminal helper: set a control as if the user typed it.
    pub fn fill(&mut self, id: &str, value: impl Into<String>) -> &mut Self {
        self.set_value(id, &FieldValue::Text(value.into()));
        self
    }

    pub fn check(&mut self, id: &str, checked: bool) -> &mut Self {
        self.set_value(id, &FieldValue::Flag(checked));
        self
    }

    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_visible(&self, step: Step) -> bool {
        self.visible.contains(&step)
    }

    pub fn progress(&self, step: Step) -> ProgressMark {
        self.progress.get(&step).copied().unwrap_or(ProgressMark::Pending)
    }

    pub fn is_sub_input_visible(&self, claim: ClaimType) -> bool {
        self.sub_inputs.contains(claim.checkbox_id())
    }

    pub fn fact_count(&self) -> usize {
        self.fact_count
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }
}

fn initial_values() -> BTreeMap<String, FieldValue> {
    FIELDS
        .iter()
        .map(|f| {
            let value = match f.kind {
                FieldKind::Checkbox => FieldValue::Flag(false),
                _ => FieldValue::Text(String::new()),
            };
            (f.id.to_string(), value)
        })
        .collect()
}

impl FormView for MemoryFormView {
    fn fields(&self, step: Option<Step>) -> Vec<FormField> {
        FIELDS
            .iter()
            .filter(|f| step.map_or(true, |s| f.step == s))
            .map(|f| FormField {
                id: f.id.to_string(),
                kind: f.kind,
                required: f.required,
                value: self.values.get(f.id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    fn set_value(&mut self, id: &str, value: &FieldValue) -> bool {
        let Some(spec) = field_spec(id) else {
            return false;
        };
        let value = match (spec.kind, value) {
            (FieldKind::Checkbox, FieldValue::Flag(b)) => FieldValue::Flag(*b),
            (FieldKind::Checkbox, FieldValue::Text(s)) => FieldValue::Flag(!s.is_empty()),
            (_, FieldValue::Text(s)) => FieldValue::Text(s.clone()),
            (_, FieldValue::Flag(b)) => FieldValue::Text(b.to_string()),
        };
        self.values.insert(id.to_string(), value);
        true
    }

    fn set_step_visible(&mut self, step: Step, visible: bool) {
        if visible {
            self.visible.insert(step);
        } else {
            self.visible.remove(&step);
        }
    }

    fn set_progress(&mut self, step: Step, mark: ProgressMark) {
        self.progress.insert(step, mark);
    }

    fn set_field_error(&mut self, id: &str, message: Option<&str>) {
        match message {
            Some(msg) => {
                self.errors.insert(id.to_string(), msg.to_string());
            }
            None => {
                self.errors.remove(id);
            }
        }
    }

    fn set_sub_input_visible(&mut self, claim: ClaimType, visible: bool) {
        if visible {
            self.sub_inputs.insert(claim.checkbox_id().to_string());
        } else {
            self.sub_inputs.remove(claim.checkbox_id());
        }
    }

    fn set_fact_count(&mut self, count: usize) {
        self.fact_count = count;
    }

    fn set_preview(&mut self, text: &str) {
        self.preview = Some(text.to_string());
    }

    fn reset(&mut self) {
        self.values = initial_values();
        self.errors.clear();
        self.sub_inputs.clear();
        self.fact_count = 0;
        self.preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut view = MemoryFormView::new();
        assert!(!view.set_value("nickname", &FieldValue::text("x")));
        assert!(view.value("nickname").is_none());
    }

    #[test]
    fn test_checkbox_coerces_value() {
        let mut view = MemoryFormView::new();
        view.set_value("claimApology", &FieldValue::text("on"));
        assert_eq!(view.value("claimApology"), Some(&FieldValue::Flag(true)));
    }

    #[test]
    fn test_whitespace_is_not_filled() {
        let field = FormField {
            id: "plaintiffName".into(),
            kind: FieldKind::Text,
            required: true,
            value: FieldValue::text("   "),
        };
        assert!(!field.is_filled());
    }

    #[test]
    fn test_border_color_follows_error_state() {
        assert_eq!(border_color(true), "#dc2626");
        assert_eq!(border_color(false), "#e5e7eb");
    }

    #[test]
    fn test_reset_restores_initial_view() {
        let mut view = MemoryFormView::new();
        view.fill("plaintiffName", "张三");
        view.set_field_error("plaintiffAddress", Some("此项为必填项"));
        view.set_sub_input_visible(ClaimType::Payment, true);
        view.set_fact_count(12);

        view.reset();

        assert_eq!(view.value("plaintiffName"), Some(&FieldValue::text("")));
        assert!(!view.has_errors());
        assert!(!view.is_sub_input_visible(ClaimType::Payment));
        assert_eq!(view.fact_count(), 0);
    }

    #[test]
    fn test_step_filter() {
        let view = MemoryFormView::new();
        let fields = view.fields(Some(Step::Defendant));
        assert_eq!(fields.len(), 6);
        assert!(fields.iter().all(|f| f.id.starts_with("defendant")));
        assert_eq!(view.fields(None).len(), FIELDS.len());
    }
}

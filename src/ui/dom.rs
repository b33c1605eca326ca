use crate::core::form::{FieldKind, Step, FIELDS};
use crate::core::state::{ClaimType, FieldValue};
use crate::services::view::{border_color, FormField, FormView, ProgressMark};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

pub const FORM_ID: &str = "indictmentForm";
pub const FACT_COUNT_ID: &str = "factCount";
pub const PREVIEW_ID: &str = "indictmentPreview";

/// [`FormView`] over the host page's complaint form.
pub struct DomFormView {
    document: Document,
}

impl DomFormView {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn read(&self, id: &str, kind: FieldKind) -> Option<FieldValue> {
        let el = self.element(id)?;
        if kind == FieldKind::Checkbox {
            return el.dyn_ref::<HtmlInputElement>().map(|i| FieldValue::Flag(i.checked()));
        }
        let text = if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            return None;
        };
        Some(FieldValue::Text(text))
    }

    fn form_group(&self, id: &str) -> Option<Element> {
        self.element(id)?.closest(".form-group").ok().flatten()
    }

    fn show(el: &Element, visible: bool) {
        if let Some(el) = el.dyn_ref::<HtmlElement>() {
            let _ = el
                .style()
                .set_property("display", if visible { "block" } else { "none" });
        }
    }
}

impl FormView for DomFormView {
    fn fields(&self, step: Option<Step>) -> Vec<FormField> {
        FIELDS
            .iter()
            .filter(|spec| step.map_or(true, |s| spec.step == s))
            .filter_map(|spec| {
                self.read(spec.id, spec.kind).map(|value| FormField {
                    id: spec.id.to_string(),
                    kind: spec.kind,
                    required: spec.required,
                    value,
                })
            })
            .collect()
    }

    fn set_value(&mut self, id: &str, value: &FieldValue) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            if input.type_() == "checkbox" {
                input.set_checked(value.is_truthy());
            } else {
                input.set_value(value.as_text().unwrap_or_default());
            }
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value.as_text().unwrap_or_default());
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value.as_text().unwrap_or_default());
        } else {
            return false;
        }
        true
    }

    fn set_step_visible(&mut self, step: Step, visible: bool) {
        if let Some(el) = self.element(&step.to_string()) {
            let _ = if visible {
                el.class_list().add_1("active")
            } else {
                el.class_list().remove_1("active")
            };
            Self::show(&el, visible);
        }
    }

    fn set_progress(&mut self, step: Step, mark: ProgressMark) {
        let Ok(marks) = self.document.query_selector_all(".progress-step") else {
            return;
        };
        let Some(el) = marks
            .item(u32::from(step.index()) - 1)
            .and_then(|n| n.dyn_into::<Element>().ok())
        else {
            return;
        };
        let classes = el.class_list();
        let _ = classes.remove_2("active", "completed");
        let _ = match mark {
            ProgressMark::Completed => classes.add_1("completed"),
            ProgressMark::Active => classes.add_1("active"),
            ProgressMark::Pending => Ok(()),
        };
    }

    fn set_field_error(&mut self, id: &str, message: Option<&str>) {
        let Some(group) = self.form_group(id) else {
            return;
        };
        if let Some(input) = self.element(id) {
            let _ = match message {
                Some(_) => input.class_list().add_1("error"),
                None => input.class_list().remove_1("error"),
            };
            if let Some(input) = input.dyn_ref::<HtmlElement>() {
                let _ = input
                    .style()
                    .set_property("border-color", border_color(message.is_some()));
            }
        }

        let existing = group.query_selector(".error-message").ok().flatten();
        match (message, existing) {
            (Some(msg), Some(el)) => el.set_text_content(Some(msg)),
            (Some(msg), None) => {
                if let Ok(el) = self.document.create_element("div") {
                    el.set_class_name("error-message");
                    el.set_text_content(Some(msg));
                    let _ = group.append_child(&el);
                }
            }
            (None, Some(el)) => el.remove(),
            (None, None) => {}
        }
    }

    fn set_sub_input_visible(&mut self, claim: ClaimType, visible: bool) {
        let sub = self
            .form_group(claim.checkbox_id())
            .and_then(|g| g.query_selector(".sub-input").ok().flatten());
        if let Some(sub) = sub {
            Self::show(&sub, visible);
        }
    }

    fn set_fact_count(&mut self, count: usize) {
        if let Some(el) = self.element(FACT_COUNT_ID) {
            el.set_text_content(Some(&count.to_string()));
        }
    }

    /// The document goes in as text; `pre-wrap` keeps its line breaks and indents.
    fn set_preview(&mut self, text: &str) {
        if let Some(el) = self.element(PREVIEW_ID) {
            if let Some(el) = el.dyn_ref::<HtmlElement>() {
                let _ = el.style().set_property("white-space", "pre-wrap");
            }
            el.set_text_content(Some(text));
        }
    }

    fn reset(&mut self) {
        if let Some(form) = self
            .element(FORM_ID)
            .and_then(|el| el.dyn_into::<HtmlFormElement>().ok())
        {
            form.reset();
        }
        if let Ok(errors) = self.document.query_selector_all(&format!("#{} .error-message", FORM_ID)) {
            for i in 0..errors.length() {
                if let Some(el) = errors.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    el.remove();
                }
            }
        }
        for spec in FIELDS {
            self.set_field_error(spec.id, None);
        }
        for claim in ClaimType::ALL {
            self.set_sub_input_visible(claim, false);
        }
        self.set_fact_count(0);
    }
}

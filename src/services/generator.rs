use crate::core::error::{PortalError, Result};
use crate::core::form::Step;
use crate::core::io::KeyValueStore;
use crate::core::state::{ClaimType, FieldValue, WizardState};
use crate::services::form_store::FormStore;
use crate::services::presenter::{Platform, ResultPresenter};
use crate::services::template;
use crate::services::view::FormView;
use crate::services::wizard::FormWizard;
use chrono::{Local, NaiveDate, Utc};
use std::sync::Arc;

/// The complaint generator as one page-scoped object: wizard, form store,
/// template and presenter wired to a single view binding and platform.
pub struct IndictmentGenerator<V: FormView> {
    view: V,
    platform: Arc<dyn Platform>,
    wizard: FormWizard,
    form: FormStore,
    presenter: ResultPresenter,
}

impl<V: FormView> IndictmentGenerator<V> {
    pub fn new(view: V, store: Arc<dyn KeyValueStore>, platform: Arc<dyn Platform>) -> Self {
        Self {
            view,
            platform,
            wizard: FormWizard::new(),
            form: FormStore::new(store),
            presenter: ResultPresenter::new(),
        }
    }

    /// Page-load setup: draw step 1 and bring back any saved input.
    pub fn init(&mut self) {
        self.wizard.render(&mut self.view);
        self.form.restore(&mut self.view);
        for claim in ClaimType::ALL {
            let checked = self
                .form
                .get(claim.checkbox_id())
                .is_some_and(FieldValue::is_checked);
            self.wizard.on_claim_toggled(&mut self.view, claim, checked);
        }
        if let Some(facts) = self.form.get("factDescription").and_then(FieldValue::as_text) {
            let facts = facts.to_string();
            self.wizard.on_fact_input(&mut self.view, &facts);
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn current_step(&self) -> Step {
        self.wizard.current_step()
    }

    pub fn document(&self) -> Option<&str> {
        self.presenter.document()
    }

    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    pub fn platform(&self) -> Arc<dyn Platform> {
        self.platform.clone()
    }

    pub fn state(&self) -> WizardState {
        WizardState {
            current_step: self.wizard.current_step(),
            form_data: self.form.data().clone(),
            generated_document: self.presenter.document().map(str::to_string),
        }
    }

    pub fn next_step(&mut self, target: Step) -> Result<()> {
        self.wizard.go_to_step(&mut self.view, &mut self.form, target)
    }

    pub fn prev_step(&mut self, target: Step) -> Result<()> {
        self.wizard.prev_step(&mut self.view, target)
    }

    /// Blur handler for a single control.
    pub fn validate_field(&mut self, id: &str) -> bool {
        let field = self.view.fields(None).into_iter().find(|f| f.id == id);
        match field {
            Some(field) => self.wizard.validate_field(&mut self.view, &field),
            None => true,
        }
    }

    /// Input handler: live capture and persistence of the whole form.
    pub fn on_field_input(&mut self) {
        self.form.capture_all(&self.view);
    }

    pub fn on_claim_toggled(&mut self, claim: ClaimType, checked: bool) {
        self.wizard.on_claim_toggled(&mut self.view, claim, checked);
    }

    pub fn on_fact_input(&mut self, text: &str) {
        self.wizard.on_fact_input(&mut self.view, text);
    }

    pub fn generate(&mut self) -> Result<&str> {
        self.generate_on(Local::now().date_naive())
    }

    /// Validates the last input step, renders the document dated `date`,
    /// previews it and moves to the result step.
    pub fn generate_on(&mut self, date: NaiveDate) -> Result<&str> {
        let current = self.wizard.current_step();
        if current != Step::ClaimsAndFacts {
            return Err(PortalError::InvalidTransition {
                from: current,
                to: Step::Result,
            });
        }
        self.wizard.validate_step(&mut self.view, Step::ClaimsAndFacts)?;
        self.form.capture_step(&self.view, Step::ClaimsAndFacts);

        let text = template::generate(self.form.data(), date);
        self.presenter.show_result(&mut self.view, text);
        self.wizard.enter_result(&mut self.view, &mut self.form)?;
        log::info!("Complaint generated ({} chars)", self.presenter.document().map_or(0, str::len));
        Ok(self.presenter.document().unwrap_or_default())
    }

    pub fn download(&self) -> Result<String> {
        self.presenter
            .download(self.platform.as_ref(), Utc::now().timestamp_millis())
    }

    pub async fn copy_to_clipboard(&self) -> Result<()> {
        self.presenter.copy_to_clipboard(self.platform.as_ref()).await
    }

    pub fn print(&self) -> Result<()> {
        self.presenter.print(self.platform.as_ref())
    }

    pub fn edit_form(&mut self) -> Result<()> {
        self.prev_step(Step::CaseAndPlaintiff)
    }

    /// Wipes every control, the saved copy and the generated document.
    /// The host asks for confirmation first.
    pub fn clear_form(&mut self) {
        self.view.reset();
        self.form.clear();
        self.presenter.clear();
        self.wizard.reset(&mut self.view);
        log::info!("Form cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStore;
    use crate::services::form_store::FORM_DATA_KEY;
    use crate::services::presenter::tests::MockPlatform;
    use crate::services::view::{MemoryFormView, ProgressMark};

    fn generator(store: Arc<dyn KeyValueStore>) -> (IndictmentGenerator<MemoryFormView>, Arc<MockPlatform>) {
        let platform = Arc::new(MockPlatform::default());
        let mut app = IndictmentGenerator::new(MemoryFormView::new(), store, platform.clone());
        app.init();
        (app, platform)
    }

    fn walk_to_step3(app: &mut IndictmentGenerator<MemoryFormView>) {
        app.view_mut()
            .fill("plaintiffName", "张三")
            .fill("plaintiffGender", "男")
            .fill("plaintiffAddress", "A市");
        app.next_step(Step::Defendant).unwrap();
        app.view_mut()
            .fill("defendantName", "李四")
            .fill("defendantGender", "女")
            .fill("defendantAddress", "B市");
        app.next_step(Step::ClaimsAndFacts).unwrap();
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_full_flow_generates_and_enters_result() {
        let (mut app, platform) = generator(Arc::new(MemoryStore::new()));
        walk_to_step3(&mut app);
        app.view_mut()
            .check("claimPayment", true)
            .fill("paymentAmount", "3000")
            .fill("factDescription", "被告借款未还。");

        let doc = app.generate_on(date()).unwrap().to_string();
        assert!(doc.contains("1. 要求支付欠款，金额：3000元；"));
        assert!(doc.contains("被告借款未还。"));
        assert!(doc.contains("2026年10月16日"));

        assert_eq!(app.current_step(), Step::Result);
        assert_eq!(app.view().preview(), Some(doc.as_str()));
        assert_eq!(app.view().progress(Step::ClaimsAndFacts), ProgressMark::Completed);
        assert_eq!(app.state().generated_document.as_deref(), Some(doc.as_str()));

        let name = app.download().unwrap();
        assert!(name.starts_with("起诉状_") && name.ends_with(".txt"));
        assert_eq!(platform.files.lock().unwrap()[0].1, doc);
    }

    #[test]
    fn test_generate_blocked_by_empty_facts() {
        let (mut app, _) = generator(Arc::new(MemoryStore::new()));
        walk_to_step3(&mut app);

        assert!(matches!(
            app.generate_on(date()),
            Err(PortalError::Validation { .. })
        ));
        assert_eq!(app.current_step(), Step::ClaimsAndFacts);
        assert!(app.document().is_none());
        assert!(app.download().is_err());
    }

    #[test]
    fn test_generate_from_first_step_is_rejected() {
        let (mut app, _) = generator(Arc::new(MemoryStore::new()));
        app.view_mut().fill("factDescription", "事实");

        assert!(matches!(
            app.generate_on(date()),
            Err(PortalError::InvalidTransition { .. })
        ));
        assert_eq!(app.current_step(), Step::CaseAndPlaintiff);
        assert!(app.document().is_none());
    }

    #[test]
    fn test_back_navigation_cannot_bypass_validation() {
        let (mut app, _) = generator(Arc::new(MemoryStore::new()));

        assert!(matches!(
            app.prev_step(Step::ClaimsAndFacts),
            Err(PortalError::InvalidTransition { .. })
        ));
        assert_eq!(app.current_step(), Step::CaseAndPlaintiff);

        app.view_mut().fill("factDescription", "事实");
        assert!(app.generate_on(date()).is_err());
        assert!(app.document().is_none());
    }

    #[test]
    fn test_edit_form_returns_to_first_step() {
        let (mut app, _) = generator(Arc::new(MemoryStore::new()));
        walk_to_step3(&mut app);
        app.view_mut().fill("factDescription", "事实");
        app.generate_on(date()).unwrap();

        app.edit_form().unwrap();
        assert_eq!(app.current_step(), Step::CaseAndPlaintiff);
        assert!(app.view().is_visible(Step::CaseAndPlaintiff));
        assert!(!app.view().is_visible(Step::Result));
        // document survives editing until regenerated or cleared
        assert!(app.document().is_some());
    }

    #[test]
    fn test_live_input_survives_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let (mut app, _) = generator(store.clone());
            app.view_mut()
                .fill("plaintiffName", "张三")
                .check("claimCompensation", true)
                .fill("factDescription", "合同纠纷");
            app.on_field_input();
        }

        let (app, _) = generator(store);
        assert_eq!(app.view().value("plaintiffName"), Some(&FieldValue::text("张三")));
        assert!(app.view().is_sub_input_visible(ClaimType::Compensation));
        assert_eq!(app.view().fact_count(), 4);
    }

    #[test]
    fn test_clear_form_resets_everything() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let (mut app, _) = generator(store.clone());
        walk_to_step3(&mut app);
        app.view_mut().fill("factDescription", "事实");
        app.on_field_input();
        app.generate_on(date()).unwrap();

        app.clear_form();

        assert_eq!(app.state(), WizardState::default());
        assert_eq!(store.get(FORM_DATA_KEY).unwrap(), None);
        assert_eq!(app.view().value("plaintiffName"), Some(&FieldValue::text("")));
        for step in Step::ALL {
            assert_eq!(app.view().is_visible(step), step == Step::CaseAndPlaintiff);
        }
    }

    #[test]
    fn test_validate_field_on_blur() {
        let (mut app, _) = generator(Arc::new(MemoryStore::new()));
        assert!(!app.validate_field("plaintiffName"));
        assert!(app.view().error("plaintiffName").is_some());
        assert!(app.validate_field("plaintiffPhone"));
        assert!(app.validate_field("unknownField"));
    }
}

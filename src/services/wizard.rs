use crate::core::error::{PortalError, Result};
use crate::core::form::Step;
use crate::core::state::ClaimType;
use crate::services::form_store::FormStore;
use crate::services::view::{FormField, FormView, ProgressMark};

pub const REQUIRED_MESSAGE: &str = "此项为必填项";

/// Step sequencing and the per-step validation gate.
///
/// Forward moves validate the current step and snapshot it into the
/// [`FormStore`]; backward moves never validate. The result step is only
/// entered through [`FormWizard::enter_result`], after a document was generated.
#[derive(Debug, Clone)]
pub struct FormWizard {
    current: Step,
}

impl Default for FormWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl FormWizard {
    pub fn new() -> Self {
        Self {
            current: Step::CaseAndPlaintiff,
        }
    }

    pub fn current_step(&self) -> Step {
        self.current
    }

    /// Shows the current step, hides the others and redraws progress.
    pub fn render(&self, view: &mut dyn FormView) {
        for step in Step::ALL {
            view.set_step_visible(step, step == self.current);
        }
        self.update_progress(view);
    }

    pub fn update_progress(&self, view: &mut dyn FormView) {
        for step in Step::ALL {
            let mark = if step < self.current {
                ProgressMark::Completed
            } else if step == self.current {
                ProgressMark::Active
            } else {
                ProgressMark::Pending
            };
            view.set_progress(step, mark);
        }
    }

    /// Marks or clears the inline error of one control.
    pub fn validate_field(&self, view: &mut dyn FormView, field: &FormField) -> bool {
        if !field.required || field.is_filled() {
            view.set_field_error(&field.id, None);
            true
        } else {
            view.set_field_error(&field.id, Some(REQUIRED_MESSAGE));
            false
        }
    }

    /// Validates every required control of `step`, marking all failures.
    pub fn validate_step(&self, view: &mut dyn FormView, step: Step) -> Result<()> {
        let mut missing = Vec::new();
        for field in view.fields(Some(step)) {
            if field.required && !self.validate_field(view, &field) {
                missing.push(field.id);
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PortalError::Validation {
                step,
                fields: missing,
            })
        }
    }

    /// Forward transition to a data-entry step.
    pub fn go_to_step(
        &mut self,
        view: &mut dyn FormView,
        form: &mut FormStore,
        target: Step,
    ) -> Result<()> {
        if !target.is_data_entry() {
            return Err(PortalError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }
        self.advance(view, form, target)
    }

    /// Backward transition; the current step is not validated.
    pub fn prev_step(&mut self, view: &mut dyn FormView, target: Step) -> Result<()> {
        if !target.is_data_entry() || target > self.current {
            return Err(PortalError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }
        self.switch_to(view, target);
        Ok(())
    }

    /// Moves from the last input step to the result step once a document exists.
    pub fn enter_result(&mut self, view: &mut dyn FormView, form: &mut FormStore) -> Result<()> {
        if self.current != Step::ClaimsAndFacts {
            return Err(PortalError::InvalidTransition {
                from: self.current,
                to: Step::Result,
            });
        }
        self.advance(view, form, Step::Result)
    }

    /// Back to the first step with every view hidden but the first,
    /// claim amounts collapsed and the fact counter at zero.
    pub fn reset(&mut self, view: &mut dyn FormView) {
        self.current = Step::CaseAndPlaintiff;
        for claim in ClaimType::ALL {
            self.on_claim_toggled(view, claim, false);
        }
        view.set_fact_count(0);
        self.render(view);
    }

    pub fn on_claim_toggled(&self, view: &mut dyn FormView, claim: ClaimType, checked: bool) {
        if claim.amount_field_id().is_some() {
            view.set_sub_input_visible(claim, checked);
        }
    }

    pub fn on_fact_input(&self, view: &mut dyn FormView, text: &str) {
        view.set_fact_count(text.chars().count());
    }

    fn advance(&mut self, view: &mut dyn FormView, form: &mut FormStore, target: Step) -> Result<()> {
        if let Err(e) = self.validate_step(view, self.current) {
            log::debug!("Staying on {}: {}", self.current, e);
            return Err(e);
        }
        form.capture_step(view, self.current);
        self.switch_to(view, target);
        Ok(())
    }

    fn switch_to(&mut self, view: &mut dyn FormView, target: Step) {
        view.set_step_visible(self.current, false);
        view.set_step_visible(target, true);
        log::info!("Wizard {} -> {}", self.current, target);
        self.current = target;
        self.update_progress(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStore;
    use crate::core::state::FieldValue;
    use crate::services::view::MemoryFormView;
    use std::sync::Arc;

    fn setup() -> (FormWizard, MemoryFormView, FormStore) {
        let wizard = FormWizard::new();
        let mut view = MemoryFormView::new();
        wizard.render(&mut view);
        (wizard, view, FormStore::new(Arc::new(MemoryStore::new())))
    }

    fn fill_step1(view: &mut MemoryFormView) {
        view.fill("plaintiffName", "张三")
            .fill("plaintiffGender", "男")
            .fill("plaintiffAddress", "A市");
    }

    #[test]
    fn test_empty_required_field_blocks_forward() {
        let (mut wizard, mut view, mut form) = setup();
        view.fill("plaintiffName", "张三").fill("plaintiffGender", "男");

        let result = wizard.go_to_step(&mut view, &mut form, Step::Defendant);
        match result {
            Err(PortalError::Validation { step, fields }) => {
                assert_eq!(step, Step::CaseAndPlaintiff);
                assert_eq!(fields, vec!["plaintiffAddress".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
        assert_eq!(view.error("plaintiffAddress"), Some(REQUIRED_MESSAGE));
        assert!(view.error("plaintiffName").is_none());
        assert!(form.data().is_empty());
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let (mut wizard, mut view, mut form) = setup();
        fill_step1(&mut view);
        view.fill("plaintiffAddress", "   ");

        assert!(wizard.go_to_step(&mut view, &mut form, Step::Defendant).is_err());
        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
    }

    #[test]
    fn test_forward_captures_and_updates_progress() {
        let (mut wizard, mut view, mut form) = setup();
        fill_step1(&mut view);

        wizard.go_to_step(&mut view, &mut form, Step::Defendant).unwrap();

        assert_eq!(wizard.current_step(), Step::Defendant);
        assert!(!view.is_visible(Step::CaseAndPlaintiff));
        assert!(view.is_visible(Step::Defendant));
        assert_eq!(view.progress(Step::CaseAndPlaintiff), ProgressMark::Completed);
        assert_eq!(view.progress(Step::Defendant), ProgressMark::Active);
        assert_eq!(view.progress(Step::ClaimsAndFacts), ProgressMark::Pending);
        assert_eq!(form.get("plaintiffAddress"), Some(&FieldValue::text("A市")));
    }

    #[test]
    fn test_error_clears_once_filled() {
        let (mut wizard, mut view, mut form) = setup();
        fill_step1(&mut view);
        view.fill("plaintiffAddress", "");
        let _ = wizard.go_to_step(&mut view, &mut form, Step::Defendant);
        assert!(view.has_errors());

        view.fill("plaintiffAddress", "A市");
        wizard.go_to_step(&mut view, &mut form, Step::Defendant).unwrap();
        assert!(!view.has_errors());
    }

    #[test]
    fn test_backward_ignores_validation() {
        let (mut wizard, mut view, mut form) = setup();
        fill_step1(&mut view);
        wizard.go_to_step(&mut view, &mut form, Step::Defendant).unwrap();

        // step 2 is completely empty
        wizard.prev_step(&mut view, Step::CaseAndPlaintiff).unwrap();
        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
        assert_eq!(view.progress(Step::Defendant), ProgressMark::Pending);
        assert!(!view.has_errors());
    }

    #[test]
    fn test_backward_move_cannot_skip_ahead() {
        let (mut wizard, mut view, _) = setup();

        assert!(matches!(
            wizard.prev_step(&mut view, Step::ClaimsAndFacts),
            Err(PortalError::InvalidTransition {
                from: Step::CaseAndPlaintiff,
                to: Step::ClaimsAndFacts,
            })
        ));
        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
        assert!(view.is_visible(Step::CaseAndPlaintiff));
        assert!(!view.is_visible(Step::ClaimsAndFacts));

        // staying in place is allowed
        wizard.prev_step(&mut view, Step::CaseAndPlaintiff).unwrap();
        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
    }

    #[test]
    fn test_reset_collapses_amounts_and_counter() {
        let (mut wizard, mut view, mut form) = setup();
        fill_step1(&mut view);
        wizard.go_to_step(&mut view, &mut form, Step::Defendant).unwrap();
        wizard.on_claim_toggled(&mut view, ClaimType::Payment, true);
        wizard.on_fact_input(&mut view, "拖欠货款");

        wizard.reset(&mut view);

        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
        assert!(!view.is_sub_input_visible(ClaimType::Payment));
        assert_eq!(view.fact_count(), 0);
        assert_eq!(view.progress(Step::CaseAndPlaintiff), ProgressMark::Active);
    }

    #[test]
    fn test_result_step_is_not_directly_reachable() {
        let (mut wizard, mut view, mut form) = setup();
        fill_step1(&mut view);

        assert!(matches!(
            wizard.go_to_step(&mut view, &mut form, Step::Result),
            Err(PortalError::InvalidTransition { .. })
        ));
        assert!(matches!(
            wizard.prev_step(&mut view, Step::Result),
            Err(PortalError::InvalidTransition { .. })
        ));
        assert!(wizard.enter_result(&mut view, &mut form).is_err());
        assert_eq!(wizard.current_step(), Step::CaseAndPlaintiff);
    }

    #[test]
    fn test_sub_input_toggle_only_for_claims_with_amount() {
        let (wizard, mut view, _) = setup();
        wizard.on_claim_toggled(&mut view, ClaimType::Payment, true);
        wizard.on_claim_toggled(&mut view, ClaimType::Apology, true);
        assert!(view.is_sub_input_visible(ClaimType::Payment));
        assert!(!view.is_sub_input_visible(ClaimType::Apology));

        wizard.on_claim_toggled(&mut view, ClaimType::Payment, false);
        assert!(!view.is_sub_input_visible(ClaimType::Payment));
    }

    #[test]
    fn test_fact_counter_counts_characters() {
        let (wizard, mut view, _) = setup();
        wizard.on_fact_input(&mut view, "被告拖欠货款");
        assert_eq!(view.fact_count(), 6);
    }
}

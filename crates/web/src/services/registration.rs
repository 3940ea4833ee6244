//! The two-step registration wizard.
//!
//! Buyers and vendors register in two steps. Step 0 collects a mobile number
//! (buyers may use an email address instead, which leaves the wizard and
//! finishes through an emailed link). Step 1 collects the detail form and
//! creates the account for the mobile stored in the session.
//!
//! [`route`] decides what a request does from the stored step, the method and
//! the `form` query parameter; the handlers only perform the action.

use rosewood_core::Mobile;

use crate::models::RegistrationStep;

/// Which step-0 form a `POST` carries (`?form=mobile` / `?form=email`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardForm {
    Mobile,
    Email,
}

impl WizardForm {
    /// Parse the `form` query parameter; anything else means no form.
    #[must_use]
    pub fn from_query(form: Option<&str>) -> Option<Self> {
        match form {
            Some("mobile") => Some(Self::Mobile),
            Some("email") => Some(Self::Email),
            _ => None,
        }
    }
}

/// What the handler should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    /// Render step 0 and (re)start the wizard.
    ShowIdentity,
    /// Validate the mobile form and move to step 1.
    SubmitMobile,
    /// Validate the email form and send an activation link.
    SubmitEmail,
    /// Render the detail form for the stored mobile.
    ShowDetails(Mobile),
    /// Validate the detail form and create the account.
    SubmitDetails(Mobile),
}

/// Route a wizard request.
///
/// A session without wizard state is at step 0. A `POST` without a known
/// form at step 0 falls back to the mobile form.
#[must_use]
pub fn route(step: Option<&RegistrationStep>, is_post: bool, form: Option<WizardForm>) -> WizardAction {
    match (step, is_post) {
        (Some(RegistrationStep::Details { mobile }), true) => {
            WizardAction::SubmitDetails(mobile.clone())
        }
        (Some(RegistrationStep::Details { mobile }), false) => {
            WizardAction::ShowDetails(mobile.clone())
        }
        (_, true) => match form {
            Some(WizardForm::Mobile) => WizardAction::SubmitMobile,
            Some(WizardForm::Email) => WizardAction::SubmitEmail,
            None => WizardAction::ShowIdentity,
        },
        (_, false) => WizardAction::ShowIdentity,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> RegistrationStep {
        RegistrationStep::Details {
            mobile: Mobile::parse("13800138000").unwrap(),
        }
    }

    #[test]
    fn test_fresh_session_shows_identity() {
        assert_eq!(route(None, false, None), WizardAction::ShowIdentity);
        assert_eq!(
            route(Some(&RegistrationStep::Identity), false, Some(WizardForm::Mobile)),
            WizardAction::ShowIdentity
        );
    }

    #[test]
    fn test_step_zero_posts() {
        let step = RegistrationStep::Identity;
        assert_eq!(
            route(Some(&step), true, Some(WizardForm::Mobile)),
            WizardAction::SubmitMobile
        );
        assert_eq!(
            route(Some(&step), true, Some(WizardForm::Email)),
            WizardAction::SubmitEmail
        );
        assert_eq!(route(Some(&step), true, None), WizardAction::ShowIdentity);
        // A first POST without prior GET still counts as step 0.
        assert_eq!(route(None, true, Some(WizardForm::Mobile)), WizardAction::SubmitMobile);
    }

    #[test]
    fn test_step_one() {
        let step = details();
        let mobile = Mobile::parse("13800138000").unwrap();
        assert_eq!(
            route(Some(&step), false, None),
            WizardAction::ShowDetails(mobile.clone())
        );
        // The form parameter is ignored once the mobile is accepted.
        assert_eq!(
            route(Some(&step), true, Some(WizardForm::Email)),
            WizardAction::SubmitDetails(mobile)
        );
    }

    #[test]
    fn test_form_query() {
        assert_eq!(WizardForm::from_query(Some("mobile")), Some(WizardForm::Mobile));
        assert_eq!(WizardForm::from_query(Some("email")), Some(WizardForm::Email));
        assert_eq!(WizardForm::from_query(Some("fax")), None);
        assert_eq!(WizardForm::from_query(None), None);
    }
}

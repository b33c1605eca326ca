use crate::core::form::Step;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value held by one form control: checkbox state or text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Non-empty text or a checked box.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

/// Flat field-id to value mapping accumulated across steps.
pub type FormData = BTreeMap<String, FieldValue>;

/// Snapshot of a wizard session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WizardState {
    pub current_step: Step,
    pub form_data: FormData,
    pub generated_document: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: Step::CaseAndPlaintiff,
            form_data: FormData::new(),
            generated_document: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    Payment,
    Compensation,
    Performance,
    Termination,
    Apology,
    Other,
}

impl ClaimType {
    pub const ALL: [ClaimType; 6] = [
        ClaimType::Payment,
        ClaimType::Compensation,
        ClaimType::Performance,
        ClaimType::Termination,
        ClaimType::Apology,
        ClaimType::Other,
    ];

    pub fn description(self) -> &'static str {
        match self {
            ClaimType::Payment => "要求支付欠款",
            ClaimType::Compensation => "要求赔偿损失",
            ClaimType::Performance => "要求继续履行合同",
            ClaimType::Termination => "要求解除合同",
            ClaimType::Apology => "要求赔礼道歉",
            ClaimType::Other => "其他诉讼请求",
        }
    }

    /// Checkbox control that selects this claim.
    pub fn checkbox_id(self) -> &'static str {
        match self {
            ClaimType::Payment => "claimPayment",
            ClaimType::Compensation => "claimCompensation",
            ClaimType::Performance => "claimPerformance",
            ClaimType::Termination => "claimTermination",
            ClaimType::Apology => "claimApology",
            ClaimType::Other => "claimOther",
        }
    }

    /// Amount sub-field revealed when the checkbox is ticked, if the claim has one.
    pub fn amount_field_id(self) -> Option<&'static str> {
        match self {
            ClaimType::Payment => Some("paymentAmount"),
            ClaimType::Compensation => Some("compensationAmount"),
            _ => None,
        }
    }

    pub fn from_checkbox_id(id: &str) -> Option<ClaimType> {
        ClaimType::ALL.into_iter().find(|c| c.checkbox_id() == id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claim {
    #[serde(rename = "type")]
    pub kind: ClaimType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl Claim {
    pub fn new(kind: ClaimType) -> Self {
        Self {
            kind,
            description: kind.description().to_string(),
            amount: None,
        }
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        let amount = amount.into();
        self.amount = if amount.trim().is_empty() { None } else { Some(amount) };
        self
    }
}

/// Identity block of one party (plaintiff or defendant).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PartyInfo {
    pub name: String,
    pub gender: String,
    pub birth_date: Option<String>,
    pub national_id: Option<String>,
    pub address: String,
    pub phone: Option<String>,
}

/// User profile as returned by the backend and kept under `currentUser`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StoredUser {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

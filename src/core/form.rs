use serde::{Deserialize, Serialize};

/// One screen of the complaint wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    CaseAndPlaintiff = 1,
    Defendant = 2,
    ClaimsAndFacts = 3,
    Result = 4,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::CaseAndPlaintiff,
        Step::Defendant,
        Step::ClaimsAndFacts,
        Step::Result,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Step> {
        Step::ALL.into_iter().find(|s| s.index() == index)
    }

    /// Steps 1-3 collect input, step 4 only shows the generated document.
    pub fn is_data_entry(self) -> bool {
        self != Step::Result
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::CaseAndPlaintiff => "案件与原告信息",
            Step::Defendant => "被告信息",
            Step::ClaimsAndFacts => "诉讼请求与事实理由",
            Step::Result => "生成结果",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Select,
    TextArea,
    Checkbox,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub step: Step,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(
    id: &'static str,
    label: &'static str,
    step: Step,
    kind: FieldKind,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        id,
        label,
        step,
        kind,
        required,
    }
}

pub const FIELDS: &[FieldSpec] = &[
    field("courtName", "受诉法院", Step::CaseAndPlaintiff, FieldKind::Text, false),
    field("caseType", "案件类型", Step::CaseAndPlaintiff, FieldKind::Select, false),
    field("plaintiffName", "原告姓名", Step::CaseAndPlaintiff, FieldKind::Text, true),
    field("plaintiffGender", "原告性别", Step::CaseAndPlaintiff, FieldKind::Select, true),
    field("plaintiffBirthDate", "原告出生日期", Step::CaseAndPlaintiff, FieldKind::Date, false),
    field("plaintiffID", "原告身份证号", Step::CaseAndPlaintiff, FieldKind::Text, false),
    field("plaintiffAddress", "原告住址", Step::CaseAndPlaintiff, FieldKind::Text, true),
    field("plaintiffPhone", "原告联系电话", Step::CaseAndPlaintiff, FieldKind::Text, false),
    field("defendantName", "被告姓名", Step::Defendant, FieldKind::Text, true),
    field("defendantGender", "被告性别", Step::Defendant, FieldKind::Select, true),
    field("defendantBirthDate", "被告出生日期", Step::Defendant, FieldKind::Date, false),
    field("defendantID", "被告身份证号", Step::Defendant, FieldKind::Text, false),
    field("defendantAddress", "被告住址", Step::Defendant, FieldKind::Text, true),
    field("defendantPhone", "被告联系电话", Step::Defendant, FieldKind::Text, false),
    field("claimPayment", "要求支付欠款", Step::ClaimsAndFacts, FieldKind::Checkbox, false),
    field("paymentAmount", "欠款金额（元）", Step::ClaimsAndFacts, FieldKind::Text, false),
    field("claimCompensation", "要求赔偿损失", Step::ClaimsAndFacts, FieldKind::Checkbox, false),
    field("compensationAmount", "赔偿金额（元）", Step::ClaimsAndFacts, FieldKind::Text, false),
    field("claimPerformance", "要求继续履行合同", Step::ClaimsAndFacts, FieldKind::Checkbox, false),
    field("claimTermination", "要求解除合同", Step::ClaimsAndFacts, FieldKind::Checkbox, false),
    field("claimApology", "要求赔礼道歉", Step::ClaimsAndFacts, FieldKind::Checkbox, false),
    field("claimOther", "其他诉讼请求", Step::ClaimsAndFacts, FieldKind::Checkbox, false),
    field("incidentDate", "纠纷发生时间", Step::ClaimsAndFacts, FieldKind::Date, false),
    field("factDescription", "事实与理由", Step::ClaimsAndFacts, FieldKind::TextArea, true),
    field("legalBasis", "法律依据", Step::ClaimsAndFacts, FieldKind::TextArea, false),
];

/// Select options offered for `caseType`, value then label.
pub const CASE_TYPES: &[(&str, &str)] = &[
    ("civil", "民事"),
    ("contract", "合同"),
    ("labor", "劳动"),
    ("property", "财产"),
    ("debt", "债务"),
    ("other", "其他"),
];

pub const GENDERS: &[&str] = &["男", "女"];

pub fn field_spec(id: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.id == id)
}

pub fn is_known_field(id: &str) -> bool {
    field_spec(id).is_some()
}

pub fn step_fields(step: Step) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |f| f.step == step)
}

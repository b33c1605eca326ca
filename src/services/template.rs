//! Civil complaint (民事起诉状) rendering.
//!
//! Pure apart from the date argument: the same input and date always
//! produce the same text.

use crate::core::state::{Claim, ClaimType, FieldValue, FormData, PartyInfo};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

pub const DEFAULT_COURT: &str = "XXX人民法院";
pub const DEFAULT_PHONE: &str = "未提供";
pub const DEFAULT_FACTS: &str = "根据相关事实和法律规定，提出上述诉讼请求。";
pub const DEFAULT_LEGAL_BASIS: &str = "依据《中华人民共和国民法典》等相关法律规定。";
pub const DEFAULT_CLAIM: &str = "请求依法判令被告承担相应法律责任";
pub const COSTS_LINE: &str = "诉讼费用由被告承担。";

/// Everything the template reads, with absent optional fields as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndictmentInput {
    pub court_name: Option<String>,
    pub case_type: Option<String>,
    pub plaintiff: PartyInfo,
    pub defendant: PartyInfo,
    pub incident_date: Option<String>,
    pub fact_description: Option<String>,
    pub legal_basis: Option<String>,
    pub claims: Vec<Claim>,
}

impl IndictmentInput {
    /// Reads the collected field mapping and derives the claim list.
    pub fn from_form(data: &FormData) -> Self {
        let text = |id: &str| -> Option<String> {
            data.get(id)
                .and_then(FieldValue::as_text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let party = |prefix: &str| PartyInfo {
            name: text(&format!("{prefix}Name")).unwrap_or_default(),
            gender: text(&format!("{prefix}Gender")).unwrap_or_default(),
            birth_date: text(&format!("{prefix}BirthDate")),
            national_id: text(&format!("{prefix}ID")),
            address: text(&format!("{prefix}Address")).unwrap_or_default(),
            phone: text(&format!("{prefix}Phone")),
        };

        let claims = ClaimType::ALL
            .into_iter()
            .filter(|kind| data.get(kind.checkbox_id()).is_some_and(FieldValue::is_checked))
            .map(|kind| {
                let claim = Claim::new(kind);
                match kind.amount_field_id().and_then(|id| text(id)) {
                    Some(amount) => claim.with_amount(amount),
                    None => claim,
                }
            })
            .collect();

        Self {
            court_name: text("courtName"),
            case_type: text("caseType"),
            plaintiff: party("plaintiff"),
            defendant: party("defendant"),
            incident_date: text("incidentDate"),
            fact_description: text("factDescription"),
            legal_basis: text("legalBasis"),
            claims,
        }
    }
}

/// Chinese label of a `caseType` select value; unknown values pass through.
pub fn case_type_label(value: &str) -> &str {
    match value {
        "civil" => "民事",
        "contract" => "合同",
        "labor" => "劳动",
        "property" => "财产",
        "debt" => "债务",
        "other" => "其他",
        other => other,
    }
}

/// `2026年10月16日`
pub fn format_long_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

pub fn generate(data: &FormData, date: NaiveDate) -> String {
    render(&IndictmentInput::from_form(data), date)
}

pub fn render(input: &IndictmentInput, date: NaiveDate) -> String {
    let mut out = String::new();

    out.push_str("民事起诉状\n\n");
    write_party(&mut out, "原告", &input.plaintiff);
    out.push('\n');
    write_party(&mut out, "被告", &input.defendant);
    out.push('\n');

    out.push_str("诉讼请求：\n");
    if input.claims.is_empty() {
        let _ = writeln!(out, "1. {}；", DEFAULT_CLAIM);
    } else {
        for (index, claim) in input.claims.iter().enumerate() {
            let _ = write!(out, "{}. {}", index + 1, claim.description);
            if let Some(amount) = &claim.amount {
                let _ = write!(out, "，金额：{}元", amount);
            }
            out.push_str("；\n");
        }
    }
    out.push_str(COSTS_LINE);
    out.push_str("\n\n");

    out.push_str("事实与理由：\n");
    out.push_str(input.fact_description.as_deref().unwrap_or(DEFAULT_FACTS));
    out.push_str("\n\n");

    let mut has_details = false;
    if let Some(incident_date) = &input.incident_date {
        let _ = writeln!(out, "纠纷发生时间：{}", incident_date);
        has_details = true;
    }
    if let Some(case_type) = &input.case_type {
        let _ = writeln!(out, "案件类型：{}纠纷", case_type_label(case_type));
        has_details = true;
    }
    if has_details {
        out.push('\n');
    }

    out.push_str("法律依据：\n");
    out.push_str(input.legal_basis.as_deref().unwrap_or(DEFAULT_LEGAL_BASIS));
    out.push_str("\n\n");

    out.push_str("综上，原告为维护自身合法权益，特向贵院提起诉讼，请求贵院依法裁判。\n\n");
    out.push_str("此致\n");
    out.push_str(input.court_name.as_deref().unwrap_or(DEFAULT_COURT));
    out.push_str("\n\n");

    let _ = writeln!(out, "    具状人：{}", input.plaintiff.name);
    let _ = writeln!(out, "    {}", format_long_date(date));
    out
}

fn write_party(out: &mut String, role: &str, party: &PartyInfo) {
    let _ = write!(out, "{}：{}，{}", role, party.name, party.gender);
    if let Some(birth_date) = &party.birth_date {
        let _ = write!(out, "，出生日期：{}", birth_date);
    }
    out.push('\n');
    if let Some(id) = &party.national_id {
        let _ = writeln!(out, "身份证号：{}", id);
    }
    let _ = writeln!(out, "住址：{}", party.address);
    let _ = writeln!(out, "联系电话：{}", party.phone.as_deref().unwrap_or(DEFAULT_PHONE));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    fn party(name: &str, gender: &str, address: &str) -> PartyInfo {
        PartyInfo {
            name: name.into(),
            gender: gender.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    fn minimal_input() -> IndictmentInput {
        IndictmentInput {
            plaintiff: party("张三", "男", "A市"),
            defendant: party("李四", "女", "B市"),
            claims: vec![Claim::new(ClaimType::Payment)],
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_document_uses_fallbacks() {
        let doc = render(&minimal_input(), date());

        assert!(doc.starts_with("民事起诉状\n"));
        assert!(doc.contains("原告：张三，男\n"));
        assert!(doc.contains("被告：李四，女\n"));
        assert!(doc.contains("1. 要求支付欠款；"));
        assert_eq!(doc.matches("联系电话：未提供").count(), 2);
        assert!(doc.contains("此致\nXXX人民法院"));
        assert!(doc.contains(DEFAULT_FACTS));
        assert!(doc.contains(DEFAULT_LEGAL_BASIS));
        assert!(doc.contains("诉讼费用由被告承担。"));
        assert!(doc.contains("    具状人：张三\n"));
        assert!(doc.ends_with("    2026年3月5日\n"));
        assert!(!doc.contains("undefined"));
        assert!(!doc.contains("null"));
        assert!(!doc.contains("纠纷发生时间"));
        assert!(!doc.contains("案件类型"));
        assert!(!doc.contains("身份证号"));
    }

    #[test]
    fn test_no_claims_emits_catch_all_line() {
        let mut input = minimal_input();
        input.claims.clear();
        let doc = render(&input, date());

        assert!(doc.contains("诉讼请求：\n1. 请求依法判令被告承担相应法律责任；\n诉讼费用由被告承担。"));
    }

    #[test]
    fn test_claims_numbered_with_amounts() {
        let mut input = minimal_input();
        input.claims = vec![
            Claim::new(ClaimType::Payment).with_amount("5000"),
            Claim::new(ClaimType::Termination),
            Claim::new(ClaimType::Apology),
        ];
        let doc = render(&input, date());

        assert!(doc.contains(
            "1. 要求支付欠款，金额：5000元；\n2. 要求解除合同；\n3. 要求赔礼道歉；\n诉讼费用由被告承担。"
        ));
    }

    #[test]
    fn test_optional_details_rendered() {
        let mut input = minimal_input();
        input.court_name = Some("北京市朝阳区人民法院".into());
        input.case_type = Some("contract".into());
        input.incident_date = Some("2025-01-10".into());
        input.plaintiff.birth_date = Some("1990-01-01".into());
        input.plaintiff.national_id = Some("110101199001011234".into());
        input.plaintiff.phone = Some("13800000000".into());
        let doc = render(&input, date());

        assert!(doc.contains("原告：张三，男，出生日期：1990-01-01\n身份证号：110101199001011234\n住址：A市\n联系电话：13800000000"));
        assert!(doc.contains("纠纷发生时间：2025-01-10\n案件类型：合同纠纷\n"));
        assert!(doc.contains("此致\n北京市朝阳区人民法院"));
        assert_eq!(doc.matches("联系电话：未提供").count(), 1);
    }

    #[test]
    fn test_unknown_case_type_passes_through() {
        assert_eq!(case_type_label("maritime"), "maritime");
        assert_eq!(case_type_label("labor"), "劳动");
    }

    #[test]
    fn test_deterministic_for_same_date() {
        let input = minimal_input();
        assert_eq!(render(&input, date()), render(&input, date()));
    }

    #[test]
    fn test_from_form_derives_claims_in_fixed_order() {
        let mut data = FormData::new();
        data.insert("plaintiffName".into(), FieldValue::text(" 张三 "));
        data.insert("claimApology".into(), FieldValue::Flag(true));
        data.insert("claimPayment".into(), FieldValue::Flag(true));
        data.insert("paymentAmount".into(), FieldValue::text("1200"));
        data.insert("claimCompensation".into(), FieldValue::Flag(false));
        data.insert("compensationAmount".into(), FieldValue::text("999"));
        data.insert("plaintiffPhone".into(), FieldValue::text(""));

        let input = IndictmentInput::from_form(&data);
        assert_eq!(input.plaintiff.name, "张三");
        assert_eq!(input.plaintiff.phone, None);
        assert_eq!(
            input.claims,
            vec![
                Claim::new(ClaimType::Payment).with_amount("1200"),
                Claim::new(ClaimType::Apology),
            ]
        );
    }

    #[test]
    fn test_every_claim_type_renders_its_description_once() {
        let mut input = minimal_input();
        input.claims = ClaimType::ALL.into_iter().map(Claim::new).collect();
        let doc = render(&input, date());

        for (i, kind) in ClaimType::ALL.into_iter().enumerate() {
            let line = format!("{}. {}；", i + 1, kind.description());
            assert_eq!(doc.matches(&line).count(), 1, "{line}");
        }
        assert!(!doc.contains("金额"));
    }
}

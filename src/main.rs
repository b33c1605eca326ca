use anyhow::Result;
use inquire::{Confirm, Select, Text};
use legal_portal::core::config::Config;
use legal_portal::core::error::PortalError;
use legal_portal::core::form::{self, FieldKind, FieldSpec, Step, CASE_TYPES, GENDERS};
use legal_portal::core::io::FileStore;
use legal_portal::core::state::{ClaimType, FieldValue};
use legal_portal::services::generator::IndictmentGenerator;
use legal_portal::services::view::MemoryFormView;
use legal_portal::utils::terminal::TerminalPlatform;
use std::sync::Arc;

type App = IndictmentGenerator<MemoryFormView>;

const EMPTY_OPTION: &str = "（不填）";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("{:#}, writing default settings", e);
            let cfg = Config::default();
            cfg.save()?;
            cfg
        }
    };
    config.ensure_directories()?;

    let store = Arc::new(FileStore::new(&config.storage_folder)?);
    let platform = Arc::new(TerminalPlatform::new(&config.output_folder));
    let mut app = IndictmentGenerator::new(MemoryFormView::new(), store, platform);
    app.init();

    loop {
        fill_wizard(&mut app)?;

        println!("\n{}", app.document().unwrap_or_default());

        if !result_actions(&mut app).await? {
            break;
        }
    }

    Ok(())
}

/// Walks the input steps from the current one until the document is generated.
fn fill_wizard(app: &mut App) -> Result<()> {
    while app.current_step().is_data_entry() {
        let step = app.current_step();
        println!("\n== 第{}步：{} ==", step.index(), step.title());
        prompt_step(app, step)?;

        let outcome = match Step::from_index(step.index() + 1) {
            Some(Step::Result) | None => app.generate().map(|_| ()),
            Some(next) => app.next_step(next),
        };

        match outcome {
            Ok(()) => {}
            Err(PortalError::Validation { fields, .. }) => {
                let labels: Vec<&str> = fields
                    .iter()
                    .filter_map(|id| form::field_spec(id))
                    .map(|spec| spec.label)
                    .collect();
                eprintln!("请填写必填项：{}", labels.join("、"));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn current_text(app: &App, id: &str) -> String {
    app.view()
        .value(id)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
        .to_string()
}

fn amount_owner(id: &str) -> Option<ClaimType> {
    ClaimType::ALL
        .into_iter()
        .find(|claim| claim.amount_field_id() == Some(id))
}

fn prompt_step(app: &mut App, step: Step) -> Result<()> {
    for spec in form::step_fields(step) {
        if let Some(claim) = amount_owner(spec.id) {
            if !app.view().is_sub_input_visible(claim) {
                continue;
            }
        }
        prompt_field(app, spec)?;
        app.on_field_input();
    }
    Ok(())
}

fn prompt_field(app: &mut App, spec: &FieldSpec) -> Result<()> {
    let label = if spec.required {
        format!("{} *", spec.label)
    } else {
        spec.label.to_string()
    };
    let current = current_text(app, spec.id);

    match spec.kind {
        FieldKind::Checkbox => {
            let checked = app
                .view()
                .value(spec.id)
                .is_some_and(FieldValue::is_checked);
            let checked = Confirm::new(&label).with_default(checked).prompt()?;
            app.view_mut().check(spec.id, checked);
            if let Some(claim) = ClaimType::from_checkbox_id(spec.id) {
                app.on_claim_toggled(claim, checked);
            }
        }
        FieldKind::Select => {
            let value = if spec.id == "caseType" {
                select_case_type(&label, &current)?
            } else {
                select_option(&label, GENDERS, &current)?
            };
            app.view_mut().fill(spec.id, value);
        }
        FieldKind::Date => {
            let value = Text::new(&label)
                .with_default(&current)
                .with_placeholder("YYYY-MM-DD")
                .prompt()?;
            app.view_mut().fill(spec.id, value);
        }
        FieldKind::Text | FieldKind::TextArea => {
            let value = Text::new(&label).with_default(&current).prompt()?;
            if spec.id == "factDescription" {
                app.on_fact_input(&value);
            }
            app.view_mut().fill(spec.id, value);
        }
    }

    app.validate_field(spec.id);
    Ok(())
}

fn select_option(label: &str, options: &[&str], current: &str) -> Result<String> {
    let mut choices = vec![EMPTY_OPTION];
    choices.extend_from_slice(options);
    let cursor = choices.iter().position(|c| *c == current).unwrap_or(0);
    let picked = Select::new(label, choices).with_starting_cursor(cursor).prompt()?;
    Ok(if picked == EMPTY_OPTION {
        String::new()
    } else {
        picked.to_string()
    })
}

fn select_case_type(label: &str, current: &str) -> Result<String> {
    let labels: Vec<&str> = CASE_TYPES.iter().map(|(_, l)| *l).collect();
    let current_label = CASE_TYPES
        .iter()
        .find(|(value, _)| *value == current)
        .map(|(_, l)| *l)
        .unwrap_or_default();
    let picked = select_option(label, &labels, current_label)?;
    Ok(CASE_TYPES
        .iter()
        .find(|(_, l)| *l == picked)
        .map(|(value, _)| value.to_string())
        .unwrap_or_default())
}

/// Returns `false` when the user is done.
async fn result_actions(app: &mut App) -> Result<bool> {
    const DOWNLOAD: &str = "下载起诉状";
    const COPY: &str = "复制到剪贴板";
    const PRINT: &str = "打印";
    const EDIT: &str = "修改表单";
    const CLEAR: &str = "清空表单";
    const QUIT: &str = "退出";

    loop {
        let action = Select::new("请选择操作：", vec![DOWNLOAD, COPY, PRINT, EDIT, CLEAR, QUIT]).prompt()?;
        let outcome = match action {
            DOWNLOAD => app.download().map(|_| ()),
            COPY => app.copy_to_clipboard().await,
            PRINT => app.print(),
            EDIT => {
                app.edit_form()?;
                return Ok(true);
            }
            CLEAR => {
                if Confirm::new("确定要清空所有表单数据吗？")
                    .with_default(false)
                    .prompt()?
                {
                    app.clear_form();
                    return Ok(true);
                }
                Ok(())
            }
            _ => return Ok(false),
        };
        if let Err(e) = outcome {
            log::error!("{}", e);
            eprintln!("{}", e.user_message());
        }
    }
}

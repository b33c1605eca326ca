//! Host-page bindings: the page's buttons call these exports.

use super::dom::DomFormView;
use super::platform::{BrowserPlatform, BrowserPosition};
use crate::core::config::Config;
use crate::core::error::PortalError;
use crate::core::form::{Step, FIELDS};
use crate::core::io::WebStore;
use crate::core::state::ClaimType;
use crate::services::auth::{AuthTab, RegistrationForm, Session};
use crate::services::generator::IndictmentGenerator;
use crate::services::geo::{HttpGeoLookup, LocationService, LOCATING};
use crate::services::notice::{Notice, NoticeLevel};
use crate::services::presenter::Platform;
use js_sys::Promise;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Document, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

type Generator = Rc<RefCell<IndictmentGenerator<DomFormView>>>;

fn to_js(e: PortalError) -> JsValue {
    JsValue::from_str(&e.user_message())
}

fn any_to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", e))
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))
}

fn input_value(document: &Document, id: &str) -> String {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|i| i.value())
        .unwrap_or_default()
}

fn set_display(document: &Document, id: &str, visible: bool) {
    if let Some(el) = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        let _ = el
            .style()
            .set_property("display", if visible { "block" } else { "none" });
    }
}

#[wasm_bindgen]
pub struct PortalApp {
    config: Config,
    platform: Arc<BrowserPlatform>,
    session: Rc<Session>,
    location: Rc<LocationService>,
    generator: Option<Generator>,
}

impl PortalApp {
    fn generator(&self) -> Result<&Generator, JsValue> {
        self.generator
            .as_ref()
            .ok_or_else(|| JsValue::from_str("No complaint form on this page"))
    }
}

#[wasm_bindgen]
impl PortalApp {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<PortalApp, JsValue> {
        let config = Config::default();
        let document = document()?;
        let platform = Arc::new(BrowserPlatform);
        let session = Rc::new(super::create_session(&config).map_err(any_to_js)?);
        let location = Rc::new(LocationService::new(
            Arc::new(BrowserPosition),
            Arc::new(HttpGeoLookup::new(&config.location)),
        ));

        let generator = if document.get_element_by_id(super::dom::FORM_ID).is_some() {
            let store = Arc::new(WebStore::new().map_err(any_to_js)?);
            let mut generator =
                IndictmentGenerator::new(DomFormView::new(document.clone()), store, platform.clone());
            generator.init();
            let generator = Rc::new(RefCell::new(generator));
            bind_form_events(&document, &generator)?;
            Some(generator)
        } else {
            None
        };

        Ok(PortalApp {
            config,
            platform,
            session,
            location,
            generator,
        })
    }

    #[wasm_bindgen(js_name = nextStep)]
    pub fn next_step(&self, target: u8) -> Result<(), JsValue> {
        let step = Step::from_index(target).ok_or_else(|| JsValue::from_str("unknown step"))?;
        self.generator()?.borrow_mut().next_step(step).map_err(to_js)
    }

    #[wasm_bindgen(js_name = prevStep)]
    pub fn prev_step(&self, target: u8) -> Result<(), JsValue> {
        let step = Step::from_index(target).ok_or_else(|| JsValue::from_str("unknown step"))?;
        self.generator()?.borrow_mut().prev_step(step).map_err(to_js)
    }

    #[wasm_bindgen(js_name = generateIndictment)]
    pub fn generate(&self) -> Result<String, JsValue> {
        let mut generator = self.generator()?.borrow_mut();
        generator.generate().map(str::to_string).map_err(to_js)
    }

    #[wasm_bindgen(js_name = downloadIndictment)]
    pub fn download(&self) -> Result<String, JsValue> {
        self.generator()?.borrow().download().map_err(to_js)
    }

    #[wasm_bindgen(js_name = copyToClipboard)]
    pub fn copy_to_clipboard(&self) -> Result<Promise, JsValue> {
        let (presenter, platform) = {
            let generator = self.generator()?.borrow();
            (generator.presenter().clone(), generator.platform())
        };
        Ok(future_to_promise(async move {
            presenter
                .copy_to_clipboard(platform.as_ref())
                .await
                .map(|_| JsValue::UNDEFINED)
                .map_err(to_js)
        }))
    }

    #[wasm_bindgen(js_name = printIndictment)]
    pub fn print(&self) -> Result<(), JsValue> {
        self.generator()?.borrow().print().map_err(to_js)
    }

    #[wasm_bindgen(js_name = editForm)]
    pub fn edit_form(&self) -> Result<(), JsValue> {
        self.generator()?.borrow_mut().edit_form().map_err(to_js)
    }

    /// Asks the user first; returns whether the form was cleared.
    #[wasm_bindgen(js_name = clearForm)]
    pub fn clear_form(&self) -> Result<bool, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
        if !window.confirm_with_message("确定要清空所有表单数据吗？")? {
            return Ok(false);
        }
        self.generator()?.borrow_mut().clear_form();
        Ok(true)
    }

    #[wasm_bindgen(js_name = switchTab)]
    pub fn switch_tab(&self, name: &str) -> Result<(), JsValue> {
        show_tab(&document()?, AuthTab::from_name(name));
        Ok(())
    }

    pub fn login(&self) -> Result<Promise, JsValue> {
        let document = document()?;
        let username = input_value(&document, "loginUsername");
        let password = input_value(&document, "loginPassword");
        let session = self.session.clone();
        let platform = self.platform.clone();
        let redirect = self.config.api.login_redirect.clone();

        Ok(future_to_promise(async move {
            match session.login(&username, &password).await {
                Ok(_) => {
                    platform.notify(Notice::blocking("登录成功"));
                    redirect_to(&redirect);
                    Ok(JsValue::TRUE)
                }
                Err(e) => {
                    log::error!("Login failed: {}", e);
                    platform.notify(Notice::blocking(e.user_message()));
                    Ok(JsValue::FALSE)
                }
            }
        }))
    }

    pub fn register(&self) -> Result<Promise, JsValue> {
        let document = document()?;
        let form = RegistrationForm {
            identity: select_or_input_value(&document, "regIdentity"),
            username: input_value(&document, "regUsername"),
            password: input_value(&document, "regPassword"),
            confirm_password: input_value(&document, "confirmPassword"),
            manual_location: input_value(&document, "manualLocation"),
            auto_location: input_value(&document, "autoLocation"),
        };
        let session = self.session.clone();
        let platform = self.platform.clone();
        let redirect = self.config.api.login_redirect.clone();

        Ok(future_to_promise(async move {
            match session.register(&form).await {
                Ok(_) => {
                    platform.notify(Notice::success("注册成功"));
                    redirect_to(&redirect);
                    Ok(JsValue::TRUE)
                }
                Err(e) => {
                    log::error!("Registration failed: {}", e);
                    platform.notify(Notice::blocking(e.user_message()));
                    if matches!(e, PortalError::AutoLogin(_)) {
                        show_tab(&document, AuthTab::Login);
                    }
                    Ok(JsValue::FALSE)
                }
            }
        }))
    }

    pub fn logout(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            if let Err(e) = session.logout().await {
                log::warn!("{}", e);
            }
            super::mount_user_nav();
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Fills `autoLocation` and reports progress in `locationStatus`.
    #[wasm_bindgen(js_name = getLocation)]
    pub fn get_location(&self) -> Result<Promise, JsValue> {
        let document = document()?;
        let (Some(status), Some(target)) = (
            document.get_element_by_id("locationStatus"),
            document
                .get_element_by_id("autoLocation")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok()),
        ) else {
            return Ok(Promise::resolve(&JsValue::UNDEFINED));
        };
        status.set_text_content(Some(LOCATING));
        let location = self.location.clone();

        Ok(future_to_promise(async move {
            let (message, level) = match location.locate().await {
                Ok(fix) => {
                    target.set_value(&fix.address);
                    (fix.status_message().to_string(), fix.source.level())
                }
                Err(e) => (e.to_string(), NoticeLevel::Error),
            };
            status.set_text_content(Some(&message));
            if let Some(status) = status.dyn_ref::<HtmlElement>() {
                let _ = status.style().set_property("color", level.color());
            }
            Ok(JsValue::UNDEFINED)
        }))
    }
}

fn select_or_input_value(document: &Document, id: &str) -> String {
    match document.get_element_by_id(id) {
        Some(el) => match el.dyn_ref::<web_sys::HtmlSelectElement>() {
            Some(select) => select.value(),
            None => input_value(document, id),
        },
        None => String::new(),
    }
}

fn show_tab(document: &Document, tab: AuthTab) {
    for other in [AuthTab::Login, AuthTab::Register] {
        let active = other == tab;
        set_display(document, other.form_id(), active);
        if let Some(el) = document.get_element_by_id(other.tab_id()) {
            let _ = if active {
                el.class_list().add_1("active")
            } else {
                el.class_list().remove_1("active")
            };
        }
    }
}

fn redirect_to(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_href(url) {
            log::error!("Redirect failed: {:?}", e);
        }
    }
}

fn listen(el: &web_sys::Element, event: &str, handler: impl FnMut() + 'static) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut()>::new(handler);
    el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Live capture, blur validation, claim toggles and the fact counter.
fn bind_form_events(document: &Document, generator: &Generator) -> Result<(), JsValue> {
    for spec in FIELDS {
        let Some(el) = document.get_element_by_id(spec.id) else {
            continue;
        };

        let g = generator.clone();
        listen(&el, "input", move || {
            if let Ok(mut g) = g.try_borrow_mut() {
                g.on_field_input();
            }
        })?;

        if spec.required {
            let g = generator.clone();
            let id = spec.id;
            listen(&el, "blur", move || {
                if let Ok(mut g) = g.try_borrow_mut() {
                    g.validate_field(id);
                }
            })?;
        }

        if let Some(claim) = ClaimType::from_checkbox_id(spec.id) {
            let g = generator.clone();
            let input = el.clone().dyn_into::<HtmlInputElement>()?;
            listen(&el, "change", move || {
                if let Ok(mut g) = g.try_borrow_mut() {
                    g.on_claim_toggled(claim, input.checked());
                    g.on_field_input();
                }
            })?;
        }

        if spec.id == "factDescription" {
            let g = generator.clone();
            let area = el.clone().dyn_into::<HtmlTextAreaElement>()?;
            listen(&el, "input", move || {
                if let Ok(mut g) = g.try_borrow_mut() {
                    g.on_fact_input(&area.value());
                }
            })?;
        }
    }
    Ok(())
}

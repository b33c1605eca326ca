use crate::services::geo::{Coordinates, LocationError, PositionSource};
use crate::services::notice::{Notice, NOTICE_DURATION_MS};
use crate::services::presenter::Platform;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, HtmlDocument, HtmlElement, HtmlTextAreaElement, Url, Window};

fn js_err(e: JsValue) -> anyhow::Error {
    anyhow!("{:?}", e)
}

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("No window available"))
}

fn document() -> Result<Document> {
    window()?.document().ok_or_else(|| anyhow!("No document available"))
}

fn blob_url(text: &str, mime: &str) -> Result<String> {
    let parts = Array::of1(&JsValue::from_str(text));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_err)?;
    Url::create_object_url_with_blob(&blob).map_err(js_err)
}

pub struct BrowserPlatform;

#[async_trait(?Send)]
impl Platform for BrowserPlatform {
    async fn write_clipboard(&self, text: &str) -> Result<()> {
        let navigator = window()?.navigator();
        let clipboard = Reflect::get(&navigator, &"clipboard".into()).map_err(js_err)?;
        if clipboard.is_undefined() {
            return Err(anyhow!("Clipboard API unavailable"));
        }
        let write_text: Function = Reflect::get(&clipboard, &"writeText".into())
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        let promise: Promise = write_text
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        JsFuture::from(promise).await.map_err(js_err)?;
        Ok(())
    }

    fn fallback_copy(&self, text: &str) -> Result<()> {
        let document = document()?;
        let body = document.body().ok_or_else(|| anyhow!("No body"))?;
        let area: HtmlTextAreaElement = document
            .create_element("textarea")
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        area.set_value(text);
        let _ = area.style().set_property("position", "fixed");
        let _ = area.style().set_property("opacity", "0");
        body.append_child(&area).map_err(js_err)?;
        area.select();

        let copied = document
            .dyn_ref::<HtmlDocument>()
            .ok_or_else(|| anyhow!("Not an HTML document"))
            .and_then(|d| d.exec_command("copy").map_err(js_err));
        area.remove();
        match copied? {
            true => Ok(()),
            false => Err(anyhow!("execCommand copy was rejected")),
        }
    }

    fn save_text_file(&self, file_name: &str, text: &str) -> Result<()> {
        let url = blob_url(text, "text/plain;charset=utf-8")?;
        let document = document()?;
        let link: HtmlAnchorElement = document
            .create_element("a")
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        link.set_href(&url);
        link.set_download(file_name);
        let _ = link.style().set_property("display", "none");
        if let Some(body) = document.body() {
            body.append_child(&link).map_err(js_err)?;
        }
        link.click();
        link.remove();
        Url::revoke_object_url(&url).map_err(js_err)?;
        Ok(())
    }

    /// The Blob URL lives until the print window has loaded it.
    fn open_print_view(&self, html: &str) -> Result<()> {
        let url = blob_url(html, "text/html;charset=utf-8")?;
        let opened = window()?
            .open_with_url_and_target(&url, "_blank")
            .map_err(js_err)
            .and_then(|w| w.ok_or_else(|| anyhow!("Print window was blocked")));
        let print_window = match opened {
            Ok(w) => w,
            Err(e) => {
                let _ = Url::revoke_object_url(&url);
                return Err(e);
            }
        };

        let revoke_url = url.clone();
        let on_load = Closure::once_into_js(move || {
            if let Err(e) = Url::revoke_object_url(&revoke_url) {
                log::warn!("Failed to revoke print view URL: {:?}", e);
            }
        });
        if let Err(e) = print_window.add_event_listener_with_callback("load", on_load.unchecked_ref()) {
            log::warn!("Print view load hook failed, URL kept alive: {:?}", e);
        }
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        if notice.blocking {
            if let Ok(w) = window() {
                let _ = w.alert_with_message(&notice.message);
            }
            return;
        }

        let Ok(document) = document() else {
            log::info!("{}", notice.message);
            return;
        };
        let Some(body) = document.body() else {
            return;
        };
        let Ok(el) = document.create_element("div") else {
            return;
        };
        el.set_class_name(&format!("alert {}", notice.level.css_class()));
        el.set_text_content(Some(&notice.message));
        if let Some(html) = el.dyn_ref::<HtmlElement>() {
            let style = html.style();
            let _ = style.set_property("position", "fixed");
            let _ = style.set_property("top", "20px");
            let _ = style.set_property("right", "20px");
            let _ = style.set_property("padding", "12px 20px");
            let _ = style.set_property("border-radius", "4px");
            let _ = style.set_property("color", "#fff");
            let _ = style.set_property("z-index", "1000");
            let _ = style.set_property("background", notice.level.color());
        }
        if body.append_child(&el).is_ok() {
            leptos::set_timeout(
                move || el.remove(),
                Duration::from_millis(u64::from(NOTICE_DURATION_MS)),
            );
        }
    }
}

/// `navigator.geolocation` wrapped as a future.
pub struct BrowserPosition;

#[async_trait(?Send)]
impl PositionSource for BrowserPosition {
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError> {
        let navigator = web_sys::window()
            .ok_or(LocationError::Unsupported)?
            .navigator();
        if !Reflect::has(&navigator, &"geolocation".into()).unwrap_or(false) {
            return Err(LocationError::Unsupported);
        }
        let geolocation = navigator
            .geolocation()
            .map_err(|_| LocationError::Unsupported)?;

        let mut request_failed = false;
        let promise = Promise::new(&mut |resolve, reject| {
            request_failed = geolocation
                .get_current_position_with_error_callback(&resolve, Some(&reject))
                .is_err();
        });
        if request_failed {
            return Err(LocationError::Unknown);
        }

        let position = JsFuture::from(promise).await.map_err(|err| {
            let code = Reflect::get(&err, &"code".into())
                .ok()
                .and_then(|c| c.as_f64())
                .unwrap_or(0.0);
            LocationError::from_code(code as u16)
        })?;

        let coord = |name: &str| -> Option<f64> {
            let coords = Reflect::get(&position, &"coords".into()).ok()?;
            Reflect::get(&coords, &name.into()).ok()?.as_f64()
        };
        match (coord("latitude"), coord("longitude")) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(LocationError::PositionUnavailable),
        }
    }
}

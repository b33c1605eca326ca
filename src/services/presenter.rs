use crate::core::error::{PortalError, Result};
use crate::services::notice::Notice;
use crate::services::view::FormView;
use async_trait::async_trait;

pub const DOWNLOAD_STARTED: &str = "起诉状已开始下载！";
pub const COPIED: &str = "起诉状内容已复制到剪贴板！";
pub const COPY_FAILED: &str = "复制失败，请手动选择文本复制";

#[cfg(target_arch = "wasm32")]
pub trait PlatformBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> PlatformBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> PlatformBounds for T {}

/// Host facilities the presenter needs: clipboard, file save, print, messages.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Platform: PlatformBounds {
    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()>;
    /// Copy through a temporary selectable text element.
    fn fallback_copy(&self, text: &str) -> anyhow::Result<()>;
    fn save_text_file(&self, file_name: &str, text: &str) -> anyhow::Result<()>;
    /// Opens a print-only view, triggers printing and closes it afterwards.
    fn open_print_view(&self, html: &str) -> anyhow::Result<()>;
    fn notify(&self, notice: Notice);
}

/// `起诉状_<epoch-millis>.txt`
pub fn download_file_name(epoch_millis: i64) -> String {
    format!("起诉状_{}.txt", epoch_millis)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Stand-alone page containing only the document.
pub fn print_document_html(text: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>打印起诉状</title>
    <style>
        body {{ font-family: 'Microsoft YaHei', sans-serif; line-height: 1.6; padding: 20px; margin: 0; }}
        pre {{ white-space: pre-wrap; margin: 0; }}
        @media print {{
            body {{ padding: 10mm; }}
            @page {{ margin: 20mm; }}
        }}
    </style>
</head>
<body>
    <pre>{}</pre>
    <script>
        window.onload = function() {{
            window.print();
            setTimeout(function() {{ window.close(); }}, 1000);
        }}
    </script>
</body>
</html>
"#,
        escape_html(text)
    )
}

/// Post-generation actions on the produced text.
#[derive(Debug, Default, Clone)]
pub struct ResultPresenter {
    document: Option<String>,
}

impl ResultPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Keeps the text for later actions and previews it.
    pub fn show_result(&mut self, view: &mut dyn FormView, text: String) {
        self.document = Some(text);
        self.preview(view);
    }

    /// Renders the literal text, whitespace untouched.
    pub fn preview(&self, view: &mut dyn FormView) {
        if let Some(doc) = &self.document {
            view.set_preview(doc);
        }
    }

    pub fn clear(&mut self) {
        self.document = None;
    }

    fn require_document(&self, platform: &dyn Platform) -> Result<&str> {
        match self.document.as_deref() {
            Some(doc) => Ok(doc),
            None => {
                platform.notify(Notice::blocking(PortalError::NoDocument.to_string()));
                Err(PortalError::NoDocument)
            }
        }
    }

    /// Saves the text as a timestamped plain-text file and returns its name.
    pub fn download(&self, platform: &dyn Platform, epoch_millis: i64) -> Result<String> {
        let doc = self.require_document(platform)?;
        let file_name = download_file_name(epoch_millis);
        platform.save_text_file(&file_name, doc)?;
        log::info!("Document offered as {}", file_name);
        platform.notify(Notice::success(DOWNLOAD_STARTED));
        Ok(file_name)
    }

    /// Clipboard write with a selectable-text fallback. Failing both is
    /// reported to the user and returned, never fatal.
    pub async fn copy_to_clipboard(&self, platform: &dyn Platform) -> Result<()> {
        let doc = self.require_document(platform)?;
        match platform.write_clipboard(doc).await {
            Ok(()) => {
                platform.notify(Notice::success(COPIED));
                Ok(())
            }
            Err(e) => {
                log::warn!("Clipboard write failed, using fallback: {:#}", e);
                match platform.fallback_copy(doc) {
                    Ok(()) => {
                        platform.notify(Notice::success(COPIED));
                        Ok(())
                    }
                    Err(e) => {
                        log::error!("Fallback copy failed: {:#}", e);
                        platform.notify(Notice::error(COPY_FAILED));
                        Err(PortalError::Other(e))
                    }
                }
            }
        }
    }

    pub fn print(&self, platform: &dyn Platform) -> Result<()> {
        let doc = self.require_document(platform)?;
        platform.open_print_view(&print_document_html(doc))?;
        Ok(())
    }
}

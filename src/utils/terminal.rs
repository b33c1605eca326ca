use crate::services::geo::{Coordinates, LocationError, PositionSource};
use crate::services::notice::{Notice, NoticeLevel};
use crate::services::presenter::Platform;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

pub const PRINT_FILE: &str = "打印起诉状.html";

/// Platform for the terminal front-end: downloads and print pages land in
/// the output folder, messages go to stdout.
pub struct TerminalPlatform {
    output_folder: PathBuf,
}

impl TerminalPlatform {
    pub fn new(output_folder: impl AsRef<Path>) -> Self {
        Self {
            output_folder: output_folder.as_ref().to_path_buf(),
        }
    }

    fn output_path(&self, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_folder)
            .with_context(|| format!("failed to create {}", self.output_folder.display()))?;
        Ok(self.output_folder.join(file_name))
    }
}

#[async_trait]
impl Platform for TerminalPlatform {
    async fn write_clipboard(&self, _text: &str) -> Result<()> {
        Err(anyhow!("clipboard is not available in the terminal"))
    }

    fn fallback_copy(&self, text: &str) -> Result<()> {
        println!("----- 请手动选择以下文本复制 -----");
        println!("{}", text);
        println!("----------------------------------");
        Ok(())
    }

    fn save_text_file(&self, file_name: &str, text: &str) -> Result<()> {
        let path = self.output_path(file_name)?;
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved {}", path.display());
        Ok(())
    }

    fn open_print_view(&self, html: &str) -> Result<()> {
        let path = self.output_path(PRINT_FILE)?;
        fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
        println!("打印页面已生成：{}（在浏览器中打开即可打印）", path.display());
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error | NoticeLevel::Warning => eprintln!("{}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => println!("{}", notice.message),
        }
    }
}

/// No positioning hardware behind a terminal.
pub struct UnsupportedPosition;

#[async_trait]
impl PositionSource for UnsupportedPosition {
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::presenter::ResultPresenter;
    use crate::services::view::MemoryFormView;
    use tempfile::tempdir;

    #[test]
    fn test_download_and_print_land_in_output_folder() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("output");
        let platform = TerminalPlatform::new(&output);

        let mut presenter = ResultPresenter::new();
        presenter.show_result(&mut MemoryFormView::new(), "民事起诉状\n".to_string());

        let name = presenter.download(&platform, 42)?;
        assert_eq!(fs::read_to_string(output.join(&name))?, "民事起诉状\n");

        presenter.print(&platform)?;
        let html = fs::read_to_string(output.join(PRINT_FILE))?;
        assert!(html.contains("<pre>民事起诉状\n</pre>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_uses_fallback() -> Result<()> {
        let dir = tempdir()?;
        let platform = TerminalPlatform::new(dir.path());
        assert!(platform.write_clipboard("x").await.is_err());

        let mut presenter = ResultPresenter::new();
        presenter.show_result(&mut MemoryFormView::new(), "正文".to_string());
        presenter.copy_to_clipboard(&platform).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_position_unsupported() {
        assert_eq!(
            UnsupportedPosition.current_position().await,
            Err(LocationError::Unsupported)
        );
    }
}

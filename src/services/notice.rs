/// How long a transient notice stays on screen.
pub const NOTICE_DURATION_MS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NoticeLevel {
    pub fn color(self) -> &'static str {
        match self {
            NoticeLevel::Success => "#4CAF50",
            NoticeLevel::Error => "#F44336",
            NoticeLevel::Warning => "#FF9800",
            NoticeLevel::Info => "#2196F3",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            NoticeLevel::Success => "alert-success",
            NoticeLevel::Error => "alert-error",
            NoticeLevel::Warning => "alert-warning",
            NoticeLevel::Info => "alert-info",
        }
    }
}

/// A message for the user. Blocking notices must be acknowledged
/// (`alert`-style); the rest fade out after [`NOTICE_DURATION_MS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub blocking: bool,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            blocking: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            blocking: true,
            ..Self::new(NoticeLevel::Warning, message)
        }
    }
}

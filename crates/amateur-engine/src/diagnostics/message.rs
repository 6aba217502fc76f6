use std::fmt;

/// Component that produced a debug message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

/// Category of a debug message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DebugKind {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Marker,
    PushGroup,
    PopGroup,
    Other,
}

/// Driver-assigned importance of a debug message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DebugSeverity {
    High,
    Medium,
    Low,
    Notification,
}

impl DebugSeverity {
    /// Log level a message of this severity is written at.
    pub fn level(self) -> log::Level {
        match self {
            DebugSeverity::High => log::Level::Error,
            DebugSeverity::Medium => log::Level::Warn,
            DebugSeverity::Low => log::Level::Info,
            DebugSeverity::Notification => log::Level::Debug,
        }
    }
}

/// One message delivered by the backend's debug output.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DebugMessage {
    pub source: DebugSource,
    pub kind: DebugKind,
    pub id: u32,
    pub severity: DebugSeverity,
    pub text: String,
}

impl DebugMessage {
    /// Error-class messages report an invalid API usage; the frame that
    /// produced one cannot be trusted.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == DebugKind::Error
    }

    /// Level this message is logged at. Error-class messages are always
    /// logged as errors, whatever severity the driver attached.
    pub fn level(&self) -> log::Level {
        if self.is_error() {
            log::Level::Error
        } else {
            self.severity.level()
        }
    }
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}/{:?} #{} {:?}] {}",
            self.source, self.kind, self.id, self.severity, self.text
        )
    }
}

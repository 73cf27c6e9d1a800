use std::process::ExitCode;

pub mod check;
pub mod run;

/// How a command finished, when it did not hit a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// At least one excerpt is available, or there was nothing to do.
    Success,

    /// The user declined the confirmation prompt.
    Cancelled,

    /// A required tool is missing (reported by `check`).
    MissingTools,

    /// Records existed and every one of them failed.
    AllFailed,
}

impl RunStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success | Self::Cancelled => ExitCode::SUCCESS,
            Self::MissingTools => ExitCode::from(1),
            Self::AllFailed => ExitCode::from(2),
        }
    }
}

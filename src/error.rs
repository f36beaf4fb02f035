use thiserror::Error;

pub type Result<T> = std::result::Result<T, GfillError>;

#[derive(Error, Debug)]
pub enum GfillError {
    #[error("{0}")]
    Config(String),
    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },
    #[error("{0}")]
    Precondition(String),
    #[error("Command failed (exit code {code}): {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::Error>),
    #[error("Reference find error: {0}")]
    RefFindExisting(#[from] Box<gix::reference::find::existing::Error>),
}

impl GfillError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GfillError::CommandFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::discover::Error> for GfillError {
    fn from(err: gix::discover::Error) -> Self {
        GfillError::GitDiscover(Box::new(err))
    }
}

impl From<gix::reference::find::Error> for GfillError {
    fn from(err: gix::reference::find::Error) -> Self {
        GfillError::RefFind(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for GfillError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        GfillError::RefFindExisting(Box::new(err))
    }
}

/// Exit code for an error returned by a subcommand driver.
///
/// Walks the context chain looking for a [`GfillError`]; anything else maps to 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GfillError>())
        .map(GfillError::exit_code)
        .unwrap_or(1)
}

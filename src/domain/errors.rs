use thiserror::Error;

/// Errors raised while loading or saving the accounts file
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No accounts file selected")]
    NotSelected,

    #[error("Accounts file not found: {0}")]
    NotFound(String),

    #[error("Cannot read accounts file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Malformed accounts file {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Cannot write accounts file {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Main account is missing from the accounts file")]
    MissingMainAccount,

    #[error("Account {0} has no API credentials")]
    MissingCredentials(String),

    #[error("No account with API credentials is configured")]
    NoUsableAccounts,

    /// The exchange answered but did not say who the main account is.
    /// Nothing is guessed; the operator has to add the uid by hand.
    #[error("Main account uid unavailable ({reason}); add a \"uuid\" field to the main account in the accounts file")]
    MainUidUnavailable { reason: String },
}

/// Errors returned by exchange gateway calls.
///
/// Transport failures and business rejections share this type so callers
/// never need to tell them apart.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Exchange rejected request [{code}]: {message}")]
    Api { code: String, message: String },

    #[error("Exchange response carried no status code")]
    MissingStatus,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Response is missing field `{0}`")]
    MissingField(String),

    #[error("Request signing failed: {0}")]
    Signing(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors caused by operator input at a prompt
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("Input must not be empty")]
    Empty,

    #[error("Not a valid number: {0}")]
    NotANumber(String),

    #[error("Choice {value} is out of range (valid: {min}-{max})")]
    OutOfRange { value: usize, min: usize, max: usize },

    #[error("Malformed selection '{0}', use a form like 1,2,3")]
    MalformedSelection(String),

    #[error("Index {0} selected more than once")]
    DuplicateIndex(usize),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Input stream closed")]
    EndOfInput,
}

/// Errors produced while planning a batch of operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Main balance {available:.6} is insufficient for any target at {per_account:.6} each")]
    InsufficientMainBalance { available: f64, per_account: f64 },

    #[error("Main account has no available balance")]
    EmptyMainBalance,

    #[error("No sub-account has a balance")]
    NoFundedSubAccounts,

    #[error("No sub-account holds at least {0:.6}")]
    NoEligibleAccounts(f64),

    #[error("No sub-accounts are configured")]
    NoSubAccounts,

    #[error("Product has no rate tiers")]
    NoTiers,
}

/// Value validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Value must be finite")]
    MustBeFinite,

    #[error("Value must be greater than zero")]
    MustBePositive,

    #[error("Value is below the 8 decimal places the exchange accepts")]
    BelowPrecision,
}

/// Errors that abort an interactive workflow and return to the menu
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("{0}")]
    Aborted(String),
}

impl WorkflowError {
    /// Input errors are treated as the operator backing out
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WorkflowError::Input(_))
    }
}

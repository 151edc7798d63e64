use thiserror::Error;

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Everything that can stop a grammar from being compiled into parse tables.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid grammar JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid rule `{name}`: {source}")]
    InvalidRule {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("the grammar has no rules")]
    NoRules,

    #[error("undefined symbol `{symbol}` referenced from rule `{rule}`")]
    UndefinedSymbol { symbol: String, rule: String },

    #[error("grammar feature `{0}` is not supported by this generator")]
    Unsupported(String),

    #[error("named precedence `{0}` is not supported; use an integer")]
    NamedPrecedence(String),

    #[error("rule `{0}` matches the empty string")]
    EmptyRule(String),

    #[error("the start rule `{0}` must not be a token")]
    TokenStartRule(String),

    #[error("token rule `{token}` refers to symbol `{symbol}`")]
    SymbolInToken { token: String, symbol: String },

    #[error("invalid pattern for token `{token}`: {message}")]
    InvalidPattern { token: String, message: String },

    #[error("extra `{0}` must be a token")]
    NonTerminalExtra(String),

    #[error("conflict entry `{0}` does not name a syntax rule")]
    InvalidConflict(String),

    #[error("word token `{0}` must be a token rule")]
    InvalidWordToken(String),

    #[error("too many {what}: {count} exceeds {limit}")]
    TableLimit {
        what: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render the parser source")]
    Render(#[from] std::fmt::Error),
}

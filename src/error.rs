//! Error types for the codec, the query capability and the builder.

use thiserror::Error;

use crate::commands::Argument;
use crate::types::ObjectId;

/// Decoding failures from [`BcsReader`](crate::bcs::BcsReader).
///
/// Encoding never fails, so every variant describes malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BcsError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("malformed ULEB128 varint (non-minimal or out of range)")]
    MalformedVarint,

    #[error("invalid bool byte 0x{0:02X}")]
    InvalidBool(u8),

    #[error("invalid {kind} tag {tag}")]
    InvalidTag { kind: &'static str, tag: u32 },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid length: expected {expected}, found {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("type nesting deeper than {0}")]
    DepthExceeded(usize),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Failures reported by a [`ChainQuery`](crate::resolve::ChainQuery) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("query cancelled")]
    Cancelled,
}

/// Errors returned by the library.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] BcsError),

    #[error("command {command} references {argument:?}, which does not exist")]
    DanglingReference { command: usize, argument: Argument },

    #[error("cannot encode pure value: {0}")]
    UnsupportedPureValue(String),

    #[error("unresolved named package: {0}")]
    UnresolvedNamedPackage(String),

    #[error("invalid named package `{0}` - expected org/app or org/app/version")]
    InvalidNamedPackage(String),

    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error("build cancelled")]
    Cancelled,

    #[error("transaction already finalized")]
    AlreadyFinalized,

    #[error("{unresolved} object input(s) need resolution but no chain client is set")]
    MissingClient { unresolved: usize },

    #[error("input {index} is unresolved and cannot be serialized")]
    UnresolvedInput { index: usize },

    #[error("sender is not set")]
    MissingSender,

    #[error("gas {0} is not set")]
    MissingGasData(&'static str),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid type tag: {0}")]
    InvalidTypeTag(String),

    #[error("invalid move call target `{0}` - expected package::module::function")]
    InvalidTarget(String),

    #[error("too many {0} - indices are limited to u16")]
    IndexOverflow(&'static str),

    #[error("unsupported serialized transaction version {0}")]
    UnsupportedVersion(u8),

    #[error("persisted transaction is invalid: {0}")]
    Persist(#[from] serde_json::Error),
}

impl TxError {
    /// Whether retrying the same build later could succeed.
    ///
    /// Transport hiccups and cancellations are transient; everything else
    /// needs the caller to change the transaction first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Query(QueryError::Transport(_) | QueryError::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcs_error_converts_into_malformed_input() {
        let err: TxError = BcsError::MalformedVarint.into();
        assert!(matches!(
            err,
            TxError::MalformedInput(BcsError::MalformedVarint)
        ));
    }

    #[test]
    fn query_error_converts() {
        let err: TxError = QueryError::Transport("reset".into()).into();
        assert!(matches!(err, TxError::Query(QueryError::Transport(_))));
    }

    #[test]
    fn transport_and_cancel_are_retryable() {
        assert!(TxError::Cancelled.is_retryable());
        assert!(TxError::Query(QueryError::Transport("x".into())).is_retryable());
    }

    #[test]
    fn structural_errors_are_not_retryable() {
        assert!(!TxError::AlreadyFinalized.is_retryable());
        assert!(!TxError::UnresolvedNamedPackage("a/b".into()).is_retryable());
        assert!(!TxError::Query(QueryError::ObjectNotFound(ObjectId::ZERO)).is_retryable());
    }

    #[test]
    fn eof_message_names_sizes() {
        let err = BcsError::UnexpectedEof {
            needed: 8,
            remaining: 3,
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of input: needed 8 bytes, 3 remaining"
        );
    }
}

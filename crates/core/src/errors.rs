//! All errors that can be _generated_ by the translator and the interpreter.

use std::io;

use thiserror::Error;

/// Any error that occurs as a result of translating the source code.
///
/// Every variant carries the byte offset into the **original** source (not the cleaned source),
/// so that the faulty construct can be located by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("error[0001]: byte {position}: too many '[' brackets. Check that each '[' has a matching ']'")]
    UnbalancedLoop { position: usize },

    #[error("error[0002]: byte {position}: too many ']' brackets. Check that each '[' has a matching ']'")]
    UnexpectedLoopClose { position: usize },

    #[error("error[0003]: byte {position}: loop body reaches offset {offset}, which does not fit in a signed byte")]
    OffsetOverflow { position: usize, offset: i64 },

    #[error("error[0004]: byte {position}: loops are nested more than {limit} deep")]
    NestingTooDeep { position: usize, limit: usize },
}

impl TranslationError {
    pub fn message_identifier(&self) -> u32 {
        use TranslationError::*;
        match self {
            UnbalancedLoop { .. } => 0x001,
            UnexpectedLoopClose { .. } => 0x002,
            OffsetOverflow { .. } => 0x003,
            NestingTooDeep { .. } => 0x004,
        }
    }

    /// Byte offset into the original source of the offending construct.
    pub fn position(&self) -> usize {
        use TranslationError::*;
        match *self {
            UnbalancedLoop { position }
            | UnexpectedLoopClose { position }
            | OffsetOverflow { position, .. }
            | NestingTooDeep { position, .. } => position,
        }
    }
}

/// Errors raised while a translated program is running.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("I/O error while running program: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_identifier_and_position() {
        let err = TranslationError::UnbalancedLoop { position: 7 };
        let message = err.to_string();

        assert!(message.starts_with("error[0001]"));
        assert!(message.contains("byte 7"));
        assert_eq!(err.position(), 7);
    }

    #[test]
    fn identifiers_are_distinct() {
        let errors = [
            TranslationError::UnbalancedLoop { position: 0 },
            TranslationError::UnexpectedLoopClose { position: 0 },
            TranslationError::OffsetOverflow {
                position: 0,
                offset: 200,
            },
            TranslationError::NestingTooDeep {
                position: 0,
                limit: 1,
            },
        ];
        let mut ids: Vec<_> = errors.iter().map(|e| e.message_identifier()).collect();
        ids.dedup();

        assert_eq!(ids.len(), errors.len());
    }
}

//! Error types for sharing-rule violations.
//!
//! The materializer and the date index are total over well-formed events and
//! default over malformed ones; the only fallible engine surface is the
//! sharing state machine.

use crate::share::ShareStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("only the recipient may {action} a share")]
    NotRecipient { action: &'static str },

    #[error("only the sender may {action} a share")]
    NotSender { action: &'static str },

    #[error("share is {status}, but {action} requires {expected}")]
    WrongStatus {
        action: &'static str,
        status: ShareStatus,
        expected: ShareStatus,
    },

    #[error("cannot share an event with its owner")]
    SelfShare,
}

pub type Result<T> = std::result::Result<T, ShareError>;

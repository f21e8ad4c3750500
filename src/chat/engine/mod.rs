//! Chat engine orchestration module.

pub mod core;

pub use self::core::{ChatBackends, ChatEngine, ClearOutcome, LoginOutcome, Notice, NoticeKind,
    SendOutcome};

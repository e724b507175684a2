//! Diagnostic quiz: scoring algorithm and persistence.
//!
//! `scorer` is pure — it never touches the database. All side effects
//! (saving responses, marking recommended methods, flagging completion)
//! live in `storage`.

pub mod scorer;
pub mod storage;

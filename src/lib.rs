//! Inbox triage — unread-mail classification and reply-drafting daemon.

pub mod classify;
pub mod config;
pub mod cycle;
pub mod draft;
pub mod error;
pub mod llm;
pub mod mail;
pub mod store;
pub mod supervisor;

//! `limit` / `offset` handling for the list endpoints.
//!
//! Parameters arrive as raw strings so that a malformed value produces the
//! API's `{"error": ...}` body instead of the extractor's plain-text rejection.

use serde::Deserialize;

use crate::error::{AppError, ApiResult};

/// Default page size of the conversation list
pub const CONVERSATIONS_PAGE_SIZE: i64 = 200;
/// Default page size of a conversation's message thread
pub const MESSAGES_PAGE_SIZE: i64 = 500;

/// Raw pagination query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PaginationParams {
    /// Resolve the window, using `default_limit` when no limit was given.
    pub fn window(&self, default_limit: i64) -> ApiResult<Window> {
        let limit = parse_non_negative("limit", self.limit.as_deref(), default_limit)?;
        let offset = parse_non_negative("offset", self.offset.as_deref(), 0)?;
        Ok(Window { limit, offset })
    }
}

/// A resolved LIMIT/OFFSET pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

impl Window {
    /// Apply the window to rows that were ordered in memory.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

fn parse_non_negative(name: &'static str, raw: Option<&str>, default: i64) -> ApiResult<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(AppError::invalid_parameter(name, raw)),
    }
}

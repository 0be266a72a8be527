// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with microsecond precision and a `Z`
/// suffix.
///
/// Fixed precision keeps lexicographic order equal to chronological order,
/// which product listings rely on when sorting by `created_at`.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time formatted for document timestamps.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

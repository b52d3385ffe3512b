//! Request-scoped ambient context (spec.md §5, §4.8): the request id, the
//! caller's requested time format, and the `env` header value, available to
//! every layer below the HTTP handler without threading them through every
//! function signature.
//!
//! Backed by `tokio::task_local!` rather than a thread-local, since a
//! request's async work can resume on a different worker thread after an
//! await point (spec.md §5).

use crate::domain::id::RequestId;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub time_format: TimeFormat,
    pub env: Option<String>,
}

/// The `X-Time-Format` values spec.md §6 enumerates, each applied to the
/// `_createdAt`/`_updatedAt` audit timestamps a write injects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    Iso8601,
    IsoInstant,
    Rfc3339,
    IsoOffsetDateTime,
    Unix,
    UnixMillis,
    BasicIsoDate,
    IsoLocalDate,
    IsoLocalDateTime,
}

impl TimeFormat {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().replace('_', "-").as_str() {
            "ISO-8601" => Self::Iso8601,
            "ISO-INSTANT" => Self::IsoInstant,
            "RFC-3339" => Self::Rfc3339,
            "ISO-OFFSET-DATE-TIME" => Self::IsoOffsetDateTime,
            "UNIX" => Self::Unix,
            "UNIX-MILLIS" => Self::UnixMillis,
            "BASIC-ISO-DATE" => Self::BasicIsoDate,
            "ISO-LOCAL-DATE" => Self::IsoLocalDate,
            "ISO-LOCAL-DATE-TIME" => Self::IsoLocalDateTime,
            _ => Self::Iso8601,
        }
    }

    /// The canonical wire token this format echoes back as (spec.md §6:
    /// "the resolved format is always echoed back").
    pub fn header_value(&self) -> &'static str {
        match self {
            Self::Iso8601 => "ISO-8601",
            Self::IsoInstant => "ISO_INSTANT",
            Self::Rfc3339 => "RFC-3339",
            Self::IsoOffsetDateTime => "ISO_OFFSET_DATE_TIME",
            Self::Unix => "UNIX",
            Self::UnixMillis => "UNIX-MILLIS",
            Self::BasicIsoDate => "BASIC_ISO_DATE",
            Self::IsoLocalDate => "ISO_LOCAL_DATE",
            Self::IsoLocalDateTime => "ISO_LOCAL_DATE_TIME",
        }
    }

    /// Render `instant` in this format (spec.md §6), used for the
    /// `_createdAt`/`_updatedAt` audit fields a write injects.
    pub fn format(&self, instant: &chrono::DateTime<chrono::Utc>) -> String {
        match self {
            Self::Iso8601 | Self::IsoInstant | Self::Rfc3339 | Self::IsoOffsetDateTime => {
                instant.to_rfc3339()
            }
            Self::Unix => instant.timestamp().to_string(),
            Self::UnixMillis => instant.timestamp_millis().to_string(),
            Self::BasicIsoDate => instant.format("%Y%m%d").to_string(),
            Self::IsoLocalDate => instant.format("%Y-%m-%d").to_string(),
            Self::IsoLocalDateTime => instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

tokio::task_local! {
    static CONTEXT: RequestContext;
}

/// Runs `fut` with `context` bound for its entire lifetime, clearing it on
/// every exit path (return, panic unwind, early `?`) once `fut` resolves —
/// `task_local` scoping does this for free.
pub async fn scope<F, T>(context: RequestContext, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CONTEXT.scope(context, fut).await
}

/// The current request's id, if called from within `scope`.
pub fn current_request_id() -> Option<RequestId> {
    CONTEXT.try_with(|ctx| ctx.request_id.clone()).ok()
}

pub fn current_time_format() -> TimeFormat {
    CONTEXT.try_with(|ctx| ctx.time_format).unwrap_or_default()
}

pub fn current_env() -> Option<String> {
    CONTEXT.try_with(|ctx| ctx.env.clone()).ok().flatten()
}

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use serde::Serialize;

/// Matches are treated as live for this long after kickoff.
pub const LIVE_WINDOW_MINUTES: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

/// Zone used when rendering kickoff dates for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// Parses offsets such as `+01:00`, `-0530` or `Z`.
    pub fn parse_offset(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return FixedOffset::east_opt(0).map(Self::Fixed);
        }
        trimmed.parse::<FixedOffset>().ok().map(Self::Fixed)
    }
}

/// Renders e.g. `Sat 18 Oct 15:00`.
pub fn format_match_date(kickoff: DateTime<Utc>, zone: DisplayZone) -> String {
    const PATTERN: &str = "%a %-d %b %H:%M";
    match zone {
        DisplayZone::Local => kickoff.with_timezone(&Local).format(PATTERN).to_string(),
        DisplayZone::Fixed(offset) => kickoff.with_timezone(&offset).format(PATTERN).to_string(),
    }
}

pub fn format_countdown(kickoff: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if kickoff <= now {
        return "now".to_string();
    }

    let remaining = kickoff - now;
    let minutes = remaining.num_minutes();
    let hours = remaining.num_hours();
    let days = remaining.num_days();

    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

pub fn match_status(kickoff: DateTime<Utc>, now: DateTime<Utc>) -> MatchStatus {
    if now < kickoff {
        MatchStatus::Scheduled
    } else if now < kickoff + Duration::minutes(LIVE_WINDOW_MINUTES) {
        MatchStatus::Live
    } else {
        MatchStatus::Finished
    }
}

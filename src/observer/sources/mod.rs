//! Context source gatherers.
//!
//! Four pure gatherers feed the context manager: time, calendar, VCS
//! reflog, and goals. Each returns a typed partial or an absence value;
//! none of them propagates its own failures past the manager's catch
//! wrapper.

pub mod calendar;
pub mod goals;
pub mod time;
pub mod vcs;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use calendar::{CalendarEvent, CalendarProvider, CalendarSnapshot, UnconfiguredCalendar};
pub use time::TimeSnapshot;
pub use vcs::VcsEntry;

use crate::config::Settings;
use crate::error::Result;
use crate::goals::GoalRepository;

/// One of the four context sources, ready to gather.
#[derive(Clone)]
pub enum ContextSource {
    Time,
    Calendar(Arc<dyn CalendarProvider>),
    Vcs(PathBuf),
    Goals(Arc<dyn GoalRepository>),
}

/// Typed partial produced by a single source.
#[derive(Debug, Clone)]
pub enum SourcePartial {
    Time(TimeSnapshot),
    Calendar(CalendarSnapshot),
    Vcs(Option<Vec<VcsEntry>>),
    Goals(String),
}

impl ContextSource {
    pub fn name(&self) -> &'static str {
        match self {
            ContextSource::Time => "time",
            ContextSource::Calendar(_) => "calendar",
            ContextSource::Vcs(_) => "vcs",
            ContextSource::Goals(_) => "goals",
        }
    }

    /// Gather this source's partial at the given instant.
    pub async fn gather(&self, settings: &Settings, now: DateTime<Utc>) -> Result<SourcePartial> {
        match self {
            ContextSource::Time => Ok(SourcePartial::Time(time::gather_time(
                now,
                settings.timezone,
                settings.working_hours_start,
                settings.working_hours_end,
            ))),
            ContextSource::Calendar(provider) => Ok(SourcePartial::Calendar(
                calendar::gather_calendar(provider.as_ref(), now).await?,
            )),
            ContextSource::Vcs(repo_path) => {
                Ok(SourcePartial::Vcs(vcs::gather_vcs(repo_path, now)?))
            }
            ContextSource::Goals(repo) => {
                Ok(SourcePartial::Goals(goals::gather_goals(repo.as_ref()).await?))
            }
        }
    }
}

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, ApiResult};

/// Dropdown value meaning "no filter".
pub const ALL_SENTINEL: &str = "Todos";

/// Filters shared by the conversation list and the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConversationFilters {
    pub status: Option<String>,
    pub etapa: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub vendedor: Option<String>,
}

impl ConversationFilters {
    /// Drop empty values and the `"Todos"` sentinel so every remaining field
    /// is a real constraint.
    pub fn normalized(self) -> Self {
        Self {
            status: selection(self.status),
            etapa: selection(self.etapa),
            date_from: present(self.date_from),
            date_to: present(self.date_to),
            vendedor: selection(self.vendedor),
        }
    }

    /// [`normalized`](Self::normalized) with dates validated and rewritten as
    /// `YYYY-MM-DD`, the only form SQL ever binds.
    pub fn validated(self) -> ApiResult<Self> {
        let mut filters = self.normalized();
        let (date_from, date_to) = filters.date_range()?;
        filters.date_from = date_from.map(|d| d.to_string());
        filters.date_to = date_to.map(|d| d.to_string());
        Ok(filters)
    }

    pub fn date_range(&self) -> ApiResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        Ok((
            parse_date("date_from", self.date_from.as_deref())?,
            parse_date("date_to", self.date_to.as_deref())?,
        ))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn selection(value: Option<String>) -> Option<String> {
    present(value).filter(|v| v != ALL_SENTINEL)
}

fn parse_date(name: &'static str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    raw.map(|value| {
        let trimmed = value.trim();
        // accept full timestamps too, the date part is what gets compared
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|_| AppError::invalid_parameter(name, value))
    })
    .transpose()
}

//! 时间范围解析
//!
//! 将 `time_range` 查询参数转换为分析接口的 `date_from` / `date_to`。

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// 日期格式（YYYY-MM-DD）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 未指定 time_range 时使用的默认值
pub const DEFAULT_TIME_RANGE: &str = "last_7_days";

/// 相对日期表：(名称, 起始日相对今天的偏移天数)
const RELATIVE_RANGES: &[(&str, i64)] = &[
    ("today", 0),
    ("last_7_days", 6),
    ("last_30_days", 29),
    ("last_90_days", 89),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Custom time range requires start_date and end_date parameters.")]
    MissingCustomBounds,
    #[error("Invalid custom date format. Use YYYY-MM-DD.")]
    InvalidFormat,
    #[error("start_date must not be after end_date.")]
    Inverted,
}

/// 发送给分析接口的日期参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParams {
    pub date_from: String,
    pub date_to: String,
}

impl DateParams {
    fn span(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: from.format(DATE_FORMAT).to_string(),
            date_to: to.format(DATE_FORMAT).to_string(),
        }
    }
}

/// 解析时间范围
///
/// # 返回值
///
/// - `Ok(Some(params))`: 已识别的范围
/// - `Ok(None)`: 无法识别的范围，不发送日期参数，由 insight 自身的默认范围决定
/// - `Err(_)`: `custom` 范围的参数缺失或格式错误
pub fn resolve(
    time_range: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
    today: NaiveDate,
) -> Result<Option<DateParams>, DateRangeError> {
    if let Some((_, offset)) = RELATIVE_RANGES.iter().find(|(name, _)| *name == time_range) {
        return Ok(Some(DateParams::span(today - Duration::days(*offset), today)));
    }

    match time_range {
        "yesterday" => {
            let yesterday = today - Duration::days(1);
            Ok(Some(DateParams::span(yesterday, yesterday)))
        }
        "this_week" => {
            let monday =
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            Ok(Some(DateParams::span(monday, today)))
        }
        "custom" => resolve_custom(start_date, end_date).map(Some),
        _ => Ok(None),
    }
}

fn resolve_custom(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<DateParams, DateRangeError> {
    let (Some(start), Some(end)) = (
        start_date.filter(|s| !s.is_empty()),
        end_date.filter(|s| !s.is_empty()),
    ) else {
        return Err(DateRangeError::MissingCustomBounds);
    };

    let from =
        NaiveDate::parse_from_str(start, DATE_FORMAT).map_err(|_| DateRangeError::InvalidFormat)?;
    let to =
        NaiveDate::parse_from_str(end, DATE_FORMAT).map_err(|_| DateRangeError::InvalidFormat)?;

    if from > to {
        return Err(DateRangeError::Inverted);
    }

    Ok(DateParams {
        date_from: start.to_string(),
        date_to: end.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn params(from: &str, to: &str) -> Option<DateParams> {
        Some(DateParams {
            date_from: from.to_string(),
            date_to: to.to_string(),
        })
    }

    #[test]
    fn relative_ranges_end_today() {
        // 2024-03-14 是周四
        let today = day("2024-03-14");

        assert_eq!(resolve("today", None, None, today), Ok(params("2024-03-14", "2024-03-14")));
        assert_eq!(
            resolve("yesterday", None, None, today),
            Ok(params("2024-03-13", "2024-03-13"))
        );
        assert_eq!(
            resolve("this_week", None, None, today),
            Ok(params("2024-03-11", "2024-03-14"))
        );
        assert_eq!(
            resolve("last_7_days", None, None, today),
            Ok(params("2024-03-08", "2024-03-14"))
        );
        assert_eq!(
            resolve("last_30_days", None, None, today),
            Ok(params("2024-02-14", "2024-03-14"))
        );
        assert_eq!(
            resolve("last_90_days", None, None, today),
            Ok(params("2023-12-16", "2024-03-14"))
        );
    }

    #[test]
    fn this_week_on_monday_is_a_single_day() {
        let monday = day("2024-03-11");
        assert_eq!(
            resolve("this_week", None, None, monday),
            Ok(params("2024-03-11", "2024-03-11"))
        );
    }

    #[test]
    fn unknown_range_sends_no_params() {
        let today = day("2024-03-14");
        assert_eq!(resolve("last_century", None, None, today), Ok(None));
        assert_eq!(resolve("", Some("2024-01-01"), None, today), Ok(None));
    }

    #[test]
    fn custom_range_validation() {
        let today = day("2024-03-14");

        assert_eq!(
            resolve("custom", Some("2024-01-01"), Some("2024-01-31"), today),
            Ok(params("2024-01-01", "2024-01-31"))
        );
        assert_eq!(
            resolve("custom", Some("2024-01-01"), None, today),
            Err(DateRangeError::MissingCustomBounds)
        );
        assert_eq!(
            resolve("custom", Some(""), Some("2024-01-31"), today),
            Err(DateRangeError::MissingCustomBounds)
        );
        assert_eq!(
            resolve("custom", Some("01/01/2024"), Some("2024-01-31"), today),
            Err(DateRangeError::InvalidFormat)
        );
        assert_eq!(
            resolve("custom", Some("2024-02-01"), Some("2024-01-31"), today),
            Err(DateRangeError::Inverted)
        );
    }
}

//! Date and time functions.
//!
//! Timestamps travel through the language as ISO-8601 strings; every function
//! here parses its input, works on a UTC [`DateTime`], and renders back to
//! text. Rendering understands .NET-style custom format tokens (`yyyy`, `MM`,
//! `dd`, `HH`, `mm`, `ss`, `fff`, ...) because that is the format language
//! host applications already use.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::evaluator::{
    ExpressionEvaluator, ReturnType, apply_with_error, validate_arity, validate_order,
    verify_string,
};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// Default rendering: ISO-8601 with millisecond precision, always UTC.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// .NET ticks (100ns units since 0001-01-01) at the Unix epoch.
const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;
const TICKS_PER_MILLISECOND: i64 = 10_000;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

// ============================================================================
// Parsing and rendering
// ============================================================================

/// Parse a timestamp string into a UTC instant.
///
/// Accepts RFC 3339 with an offset, the same without an offset (taken as
/// UTC), and bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_iso_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{}Z", text)) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!("{} is not a valid timestamp", text))
}

/// Render one run of a repeated format character.
fn render_token(dt: &DateTime<Utc>, token: char, count: usize, out: &mut String) {
    match token {
        'y' => match count {
            1 => out.push_str(&(dt.year() % 100).to_string()),
            2 => out.push_str(&format!("{:02}", dt.year() % 100)),
            _ => out.push_str(&format!("{:04}", dt.year())),
        },
        'M' => match count {
            1 => out.push_str(&dt.month().to_string()),
            2 => out.push_str(&format!("{:02}", dt.month())),
            3 => out.push_str(&MONTH_NAMES[dt.month0() as usize][..3]),
            _ => out.push_str(MONTH_NAMES[dt.month0() as usize]),
        },
        'd' => match count {
            1 => out.push_str(&dt.day().to_string()),
            2 => out.push_str(&format!("{:02}", dt.day())),
            3 => out.push_str(&DAY_NAMES[dt.weekday().num_days_from_sunday() as usize][..3]),
            _ => out.push_str(DAY_NAMES[dt.weekday().num_days_from_sunday() as usize]),
        },
        'H' => match count {
            1 => out.push_str(&dt.hour().to_string()),
            _ => out.push_str(&format!("{:02}", dt.hour())),
        },
        'h' => {
            let (_, hour) = dt.hour12();
            match count {
                1 => out.push_str(&hour.to_string()),
                _ => out.push_str(&format!("{:02}", hour)),
            }
        }
        'm' => match count {
            1 => out.push_str(&dt.minute().to_string()),
            _ => out.push_str(&format!("{:02}", dt.minute())),
        },
        's' => match count {
            1 => out.push_str(&dt.second().to_string()),
            _ => out.push_str(&format!("{:02}", dt.second())),
        },
        'f' => {
            // Fractional seconds, one digit per repeat, at most 100ns units.
            let digits = count.min(7);
            let value = dt.nanosecond() / 10u32.pow(9 - digits as u32);
            out.push_str(&format!("{:0width$}", value, width = digits));
        }
        't' => {
            let (pm, _) = dt.hour12();
            let marker = if pm { "PM" } else { "AM" };
            match count {
                1 => out.push_str(&marker[..1]),
                _ => out.push_str(marker),
            }
        }
        // Values are always UTC by the time they are rendered.
        'K' => out.push('Z'),
        'z' => match count {
            1 => out.push_str("+0"),
            2 => out.push_str("+00"),
            _ => out.push_str("+00:00"),
        },
        _ => {}
    }
}

/// Walk a .NET custom format string, expanding token runs and passing quoted
/// or unrecognized text through as literals.
fn format_datetime(dt: &DateTime<Utc>, format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                out.push(chars[i + 1]);
                i += 2;
            }
            '\'' | '"' => {
                let quote = c;
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    out.push(chars[i]);
                    i += 1;
                }
                i += 1;
            }
            'y' | 'M' | 'd' | 'H' | 'h' | 'm' | 's' | 'f' | 't' | 'K' | 'z' => {
                let start = i;
                while i < chars.len() && chars[i] == c {
                    i += 1;
                }
                render_token(dt, c, i - start, &mut out);
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

/// Apply an optional format argument, falling back to ISO-8601.
fn render_timestamp(dt: &DateTime<Utc>, format: Option<&Value>) -> Result<Value, String> {
    match format {
        None => Ok(Value::String(dt.format(ISO_FORMAT).to_string())),
        Some(Value::String(f)) => Ok(Value::String(format_datetime(dt, f))),
        Some(_) => Err("format must be a string".to_string()),
    }
}

// ============================================================================
// Ticks and epochs
// ============================================================================

fn ticks_of(value: &Value) -> Result<BigInt, String> {
    match value {
        Value::Integer(n) => Ok(BigInt::from(*n)),
        Value::Float(f) if f.fract() == 0.0 => Ok(BigInt::from(*f as i64)),
        Value::String(s) => s
            .trim()
            .parse::<BigInt>()
            .map_err(|_| format!("{} is not a number, numeric string or bigInt", s)),
        other => Err(format!(
            "{} is not a number, numeric string or bigInt",
            other.as_string()
        )),
    }
}

fn instant_from_millis(millis: i64, source: &str) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| format!("{} is out of range for a timestamp", source))
}

// ============================================================================
// Duration arithmetic
// ============================================================================

fn add_duration(args: &[Value], name: &str, unit_seconds: i64) -> Result<Value, String> {
    let Value::String(timestamp) = &args[0] else {
        return Err(format!("{} requires a timestamp string", name));
    };
    let dt = parse_iso_timestamp(timestamp)?;
    let Value::Integer(amount) = &args[1] else {
        return Err(format!("{} requires an integer amount", name));
    };
    let result = i64::try_from(*amount as i128 * unit_seconds as i128)
        .ok()
        .and_then(|seconds| Duration::new(seconds, 0))
        .and_then(|delta| dt.checked_add_signed(delta));
    match result {
        Some(shifted) => render_timestamp(&shifted, args.get(2)),
        None => Err(format!("{} result is out of range", name)),
    }
}

fn duration_function(name: &'static str, unit_seconds: i64) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        name,
        apply_with_error(
            move |args| add_duration(args, name, unit_seconds),
            None,
        ),
        ReturnType::STRING,
        validate_order(
            &[ReturnType::STRING],
            &[ReturnType::STRING, ReturnType::NUMBER],
        ),
    )
}

// ============================================================================
// Components
// ============================================================================

fn date_part(name: &'static str, part: fn(&DateTime<Utc>) -> i64) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        name,
        apply_with_error(
            move |args| match &args[0] {
                Value::String(s) => Ok(Value::Integer(part(&parse_iso_timestamp(s)?))),
                _ => Err(format!("{} requires a timestamp string", name)),
            },
            Some(verify_string),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    )
}

// ============================================================================
// Registration
// ============================================================================

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(ExpressionEvaluator::new(
        "formatDateTime",
        apply_with_error(
            |args| match &args[0] {
                Value::String(s) => {
                    let dt = parse_iso_timestamp(s)?;
                    render_timestamp(&dt, args.get(1))
                }
                other => Err(format!("{} is not a valid timestamp", other.as_string())),
            },
            None,
        ),
        ReturnType::STRING,
        validate_order(&[ReturnType::STRING], &[ReturnType::STRING]),
    ));
    registry.register(ExpressionEvaluator::new(
        "formatTicks",
        apply_with_error(
            |args| {
                let ticks = ticks_of(&args[0])?;
                let millis = (ticks - BigInt::from(TICKS_AT_UNIX_EPOCH))
                    / BigInt::from(TICKS_PER_MILLISECOND);
                let millis = millis
                    .to_i64()
                    .ok_or_else(|| {
                        format!("{} is out of range for a timestamp", args[0].as_string())
                    })?;
                let dt = instant_from_millis(millis, &args[0].as_string())?;
                render_timestamp(&dt, args.get(1))
            },
            None,
        ),
        ReturnType::STRING,
        validate_order(&[ReturnType::STRING], &[ReturnType::NUMBER]),
    ));
    registry.register(ExpressionEvaluator::new(
        "formatEpoch",
        apply_with_error(
            |args| {
                let Some(seconds) = args[0].as_float() else {
                    return Err(format!("{} is not a number", args[0].as_string()));
                };
                let millis = (seconds * 1000.0).round();
                if !millis.is_finite()
                    || millis < i64::MIN as f64
                    || millis > i64::MAX as f64
                {
                    return Err(format!(
                        "{} is out of range for a timestamp",
                        args[0].as_string()
                    ));
                }
                let dt = instant_from_millis(millis as i64, &args[0].as_string())?;
                render_timestamp(&dt, args.get(1))
            },
            None,
        ),
        ReturnType::STRING,
        validate_order(&[ReturnType::STRING], &[ReturnType::NUMBER]),
    ));
    registry.register(ExpressionEvaluator::new(
        "ticks",
        apply_with_error(
            |args| match &args[0] {
                Value::String(s) => {
                    let dt = parse_iso_timestamp(s)?;
                    let ticks = dt.timestamp_millis() as i128 * TICKS_PER_MILLISECOND as i128
                        + TICKS_AT_UNIX_EPOCH as i128;
                    i64::try_from(ticks)
                        .map(Value::Integer)
                        .map_err(|_| format!("{} is out of range for ticks", s))
                }
                _ => Err("ticks requires a timestamp string".to_string()),
            },
            Some(verify_string),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "utcNow",
        apply_with_error(
            |args| render_timestamp(&Utc::now(), args.first()),
            None,
        ),
        ReturnType::STRING,
        validate_order(&[ReturnType::STRING], &[]),
    ));

    registry.register(duration_function("addSeconds", 1));
    registry.register(duration_function("addMinutes", 60));
    registry.register(duration_function("addHours", 3600));
    registry.register(duration_function("addDays", 86400));

    registry.register(date_part("year", |dt| dt.year() as i64));
    registry.register(date_part("month", |dt| dt.month() as i64));
    registry.register(date_part("dayOfMonth", |dt| dt.day() as i64));
    registry.register(date_part("dayOfWeek", |dt| {
        dt.weekday().num_days_from_sunday() as i64
    }));
    registry.register(ExpressionEvaluator::new(
        "getTimeOfDay",
        apply_with_error(
            |args| match &args[0] {
                Value::String(s) => {
                    let dt = parse_iso_timestamp(s)?;
                    let (hour, minute) = (dt.hour(), dt.minute());
                    let name = if hour == 0 && minute == 0 {
                        "midnight"
                    } else if hour < 12 {
                        "morning"
                    } else if hour < 18 {
                        "afternoon"
                    } else if hour < 22 {
                        "evening"
                    } else {
                        "night"
                    };
                    Ok(Value::String(name.to_string()))
                }
                _ => Err("getTimeOfDay requires a timestamp string".to_string()),
            },
            Some(verify_string),
        ),
        ReturnType::STRING,
        validate_arity(1, Some(1)),
    ));
}

//! Five-field cron validation (minute, hour, day-of-month, month, day-of-week).

use crate::domain::error::CronError;

const FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day-of-month", 1, 31),
    ("month", 1, 12),
    ("day-of-week", 0, 7),
];

/// Validate a 5-field cron expression.
///
/// Each field is a comma-separated list of `*`, `N`, or `A-B`, each with an
/// optional `/STEP`.
///
/// # Errors
///
/// Returns `CronError` naming the first offending field.
pub fn validate_cron(expr: &str) -> Result<(), CronError> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != FIELDS.len() {
        return Err(CronError::FieldCount {
            expr: expr.to_string(),
            got: fields.len(),
        });
    }
    for (value, (name, min, max)) in fields.iter().zip(FIELDS) {
        validate_field(value, min, max).map_err(|reason| CronError::Field {
            field: name,
            value: (*value).to_string(),
            reason,
        })?;
    }
    Ok(())
}

fn validate_field(value: &str, min: u32, max: u32) -> Result<(), String> {
    for part in value.split(',') {
        if part.is_empty() {
            return Err("empty list element".to_string());
        }
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (part, None),
        };
        if let Some(step) = step {
            let step: u32 = step
                .parse()
                .map_err(|_| format!("step {step:?} is not a number"))?;
            if step == 0 {
                return Err("step must be greater than zero".to_string());
            }
        }
        if base == "*" {
            continue;
        }
        if let Some((start, end)) = base.split_once('-') {
            let start = bounded(start, min, max)?;
            let end = bounded(end, min, max)?;
            if start > end {
                return Err(format!("range start {start} is after end {end}"));
            }
        } else {
            bounded(base, min, max)?;
        }
    }
    Ok(())
}

fn bounded(raw: &str, min: u32, max: u32) -> Result<u32, String> {
    let n: u32 = raw
        .parse()
        .map_err(|_| format!("{raw:?} is not a number"))?;
    if n < min || n > max {
        return Err(format!("{n} is outside {min}-{max}"));
    }
    Ok(n)
}

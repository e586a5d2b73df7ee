use crate::calendar::WEEKDAY_NAMES;
use crate::error::{PresenceError, Result};

/// Splits free text into person names. Names are separated by newlines,
/// commas or semicolons; blanks are dropped and repeats keep the first
/// occurrence.
pub fn parse_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for part in text.split(['\n', ',', ';']) {
        let name = part.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    // 1. Exact match
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    // 2. Prefix match
    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(PresenceError::validation(format!("Unknown key: '{}'", key))),
        _ => Err(PresenceError::validation(format!("Ambiguous key: '{}' matches {:?}", key, matches))),
    }
}

/// Accepts `0`..`6` (0 = Sunday) or an unambiguous prefix of an English
/// weekday name ("mon", "th", "saturday").
pub fn parse_weekday(input: &str) -> Result<u8> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err(PresenceError::validation("empty weekday"));
    }
    if let Ok(n) = input.parse::<u8>() {
        if n <= 6 {
            return Ok(n);
        }
        return Err(PresenceError::validation(format!("weekday {} is not in 0..=6", n)));
    }

    let candidates: Vec<String> = WEEKDAY_NAMES.iter().map(|n| n.to_lowercase()).collect();
    let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
    let name = expand_key(&input, &candidates)?;
    candidates
        .iter()
        .position(|c| *c == name)
        .map(|i| i as u8)
        .ok_or_else(|| PresenceError::validation(format!("unknown weekday '{}'", input)))
}

/// Comma separated weekdays, or the shorthands `weekdays` (Mon-Fri) and `all`.
pub fn parse_weekdays(input: &str) -> Result<Vec<u8>> {
    match input.trim().to_lowercase().as_str() {
        "all" => return Ok((0..=6).collect()),
        "weekdays" => return Ok((1..=5).collect()),
        _ => {}
    }
    let mut weekdays = Vec::new();
    for token in input.split(',').filter(|t| !t.trim().is_empty()) {
        let weekday = parse_weekday(token)?;
        if !weekdays.contains(&weekday) {
            weekdays.push(weekday);
        }
    }
    if weekdays.is_empty() {
        return Err(PresenceError::validation("no weekdays given"));
    }
    Ok(weekdays)
}

/// Day numbers such as `1,3,10-14`. Sorted and deduplicated.
pub fn parse_days(input: &str) -> Result<Vec<u32>> {
    let mut days = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let start = parse_day(start)?;
            let end = parse_day(end)?;
            if start > end {
                return Err(PresenceError::validation(format!("invalid day range '{}'", token)));
            }
            days.extend(start..=end);
        } else {
            days.push(parse_day(token)?);
        }
    }
    if days.is_empty() {
        return Err(PresenceError::validation("no days given"));
    }
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

fn parse_day(token: &str) -> Result<u32> {
    token
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| PresenceError::validation(format!("invalid day '{}'", token.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        let names = parse_names("Alice, Bob;Carol\n\n  Dave  \nAlice,,");
        assert_eq!(names, vec!["Alice", "Bob", "Carol", "Dave"]);
        assert!(parse_names(" ,;\n").is_empty());
    }

    #[test]
    fn test_expand_key() {
        let candidates = vec!["sunday", "monday", "tuesday", "thursday"];

        assert_eq!(expand_key("m", &candidates).unwrap(), "monday");
        assert_eq!(expand_key("tu", &candidates).unwrap(), "tuesday");
        assert_eq!(expand_key("monday", &candidates).unwrap(), "monday");

        // Ambiguous
        assert!(expand_key("t", &candidates).is_err());

        // Unknown
        assert!(expand_key("x", &candidates).is_err());
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("0").unwrap(), 0);
        assert_eq!(parse_weekday("mon").unwrap(), 1);
        assert_eq!(parse_weekday("Th").unwrap(), 4);
        assert_eq!(parse_weekday("SATURDAY").unwrap(), 6);
        assert!(parse_weekday("7").is_err());
        assert!(parse_weekday("s").is_err());
        assert!(parse_weekday("").is_err());
    }

    #[test]
    fn test_parse_weekdays() {
        assert_eq!(parse_weekdays("mon,tue,mon").unwrap(), vec![1, 2]);
        assert_eq!(parse_weekdays("weekdays").unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(parse_weekdays("all").unwrap().len(), 7);
        assert!(parse_weekdays(",").is_err());
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days("5, 1,3-4,3").unwrap(), vec![1, 3, 4, 5]);
        assert!(parse_days("4-2").is_err());
        assert!(parse_days("0").is_err());
        assert!(parse_days("32").is_err());
        assert!(parse_days("x").is_err());
        assert!(parse_days("").is_err());
    }
}

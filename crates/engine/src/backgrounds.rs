//! Background list: newline-separated names, one picked per launch.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub fn pick(names: &[String], seed: u64) -> Option<&String> {
    if names.is_empty() {
        return None;
    }
    names.get((seed % names.len() as u64) as usize)
}

pub fn session_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_dropped() {
        let names = parse_list("a.jpg\n\n  b.png  \n");
        assert_eq!(names, vec!["a.jpg".to_string(), "b.png".to_string()]);
    }

    #[test]
    fn pick_is_stable_for_a_seed() {
        let names = parse_list("a.jpg\nb.png\nc.webp");
        assert_eq!(pick(&names, 4), Some(&"b.png".to_string()));
        assert_eq!(pick(&names, 4), Some(&"b.png".to_string()));
    }

    #[test]
    fn empty_list_picks_nothing() {
        assert_eq!(pick(&[], 7), None);
    }
}

//! Links-file parsing: one entry per line, blank lines ignored.

use homedeck_core::LinkRecord;
use url::Url;

/// Parse a whole links file.
pub fn parse_links(text: &str) -> Vec<LinkRecord> {
    text.lines().filter_map(parse_line).collect()
}

/// Parse one `<url> ["display name"] ["icon-file"]` line. Whitespace splits
/// tokens; double-quoted runs stay one token with the quotes stripped. A
/// missing display name falls back to the URL host's first label (leading
/// `www.` removed), or the literal "Link" when the URL does not parse.
pub fn parse_line(line: &str) -> Option<LinkRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut tokens = split_tokens(line).into_iter();
    let url = tokens.next()?;
    let mut display_name = tokens.next().unwrap_or_default();
    let image_path = tokens.next().unwrap_or_default();

    if display_name.is_empty() {
        display_name = host_label(&url).unwrap_or_else(|| "Link".to_string());
    }

    Some(LinkRecord {
        url,
        display_name,
        image_path,
    })
}

pub(crate) fn split_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let label = host.split('.').next()?;
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_line_parses_verbatim() {
        let record = parse_line(r#"https://example.com "My Example" icon.png"#).unwrap();
        assert_eq!(record.url, "https://example.com");
        assert_eq!(record.display_name, "My Example");
        assert_eq!(record.image_path, "icon.png");
    }

    #[test]
    fn display_name_falls_back_to_host_label() {
        let record = parse_line("https://www.example.co.uk/path").unwrap();
        assert_eq!(record.display_name, "example");
    }

    #[test]
    fn unparseable_url_falls_back_to_link() {
        let record = parse_line("notaurl").unwrap();
        assert_eq!(record.url, "notaurl");
        assert_eq!(record.display_name, "Link");
    }

    #[test]
    fn extra_tokens_become_name_and_icon() {
        let record = parse_line("not a url").unwrap();
        assert_eq!(record.url, "not");
        assert_eq!(record.display_name, "a");
        assert_eq!(record.image_path, "url");
    }

    #[test]
    fn blank_and_whitespace_lines_yield_nothing() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \t ").is_none());
    }

    #[test]
    fn quoted_runs_keep_inner_whitespace() {
        let tokens = split_tokens(r#"https://a "two words" "also this""#);
        assert_eq!(tokens, vec!["https://a", "two words", "also this"]);
    }

    #[test]
    fn whole_file_scenario() {
        let records = parse_links("https://example.com \"Example\" \nhttps://noname.org\n\n");
        assert_eq!(
            records,
            vec![
                LinkRecord {
                    url: "https://example.com".to_string(),
                    display_name: "Example".to_string(),
                    image_path: String::new(),
                },
                LinkRecord {
                    url: "https://noname.org".to_string(),
                    display_name: "noname".to_string(),
                    image_path: String::new(),
                },
            ]
        );
    }
}

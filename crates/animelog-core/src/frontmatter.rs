//! Note front-matter: the YAML header between `---` fences.

use serde::{Deserialize, Serialize};

use crate::error::AnimelogError;

/// Front-matter keys written on every note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteFrontmatter {
    pub mal_id: Option<u64>,
    pub title: Option<String>,
    pub year_season: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteFrontmatter {
    /// Render as a fenced YAML header, ending with a newline.
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        if let Some(id) = self.mal_id {
            out.push_str(&format!("mal_id: {id}\n"));
        }
        if let Some(title) = &self.title {
            out.push_str(&format!("title: {}\n", yaml_quote(title)));
        }
        if let Some(label) = &self.year_season {
            out.push_str(&format!("year_season: {}\n", yaml_quote(label)));
        }
        if self.tags.is_empty() {
            out.push_str("tags: []\n");
        } else {
            out.push_str("tags:\n");
            for tag in &self.tags {
                out.push_str(&format!("  - {tag}\n"));
            }
        }
        out.push_str("---\n");
        out
    }
}

/// Double-quoted YAML scalar.
fn yaml_quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Split `text` into its YAML header and the rest, if it has a header.
pub fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    if let Some(body) = rest.strip_prefix("---") {
        return Some(("", body.trim_start_matches(['\r', '\n'])));
    }
    let end = rest.find("\n---")?;
    let yaml = &rest[..end];
    let after = &rest[end + 4..];
    Some((yaml, after.trim_start_matches(['\r', '\n'])))
}

/// Parse the front-matter of `text`; `Ok(None)` when there is none.
pub fn parse_frontmatter(text: &str) -> Result<Option<NoteFrontmatter>, AnimelogError> {
    let Some((yaml, _)) = split_frontmatter(text) else {
        return Ok(None);
    };
    if yaml.trim().is_empty() {
        return Ok(Some(NoteFrontmatter::default()));
    }
    serde_yaml::from_str(yaml)
        .map(Some)
        .map_err(|e| AnimelogError::Parse(format!("front-matter: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_and_parse() {
        let fm = NoteFrontmatter {
            mal_id: Some(5114),
            title: Some("Fullmetal Alchemist: \"Brotherhood\"".into()),
            year_season: Some("2009年 春".into()),
            tags: vec!["animelog".into(), "animelog_2009".into()],
        };
        let text = format!("{}\n# body\n", fm.render());
        assert!(text.starts_with("---\nmal_id: 5114\n"));

        let parsed = parse_frontmatter(&text).unwrap().unwrap();
        assert_eq!(parsed, fm);
    }

    #[test]
    fn test_split_frontmatter() {
        let (yaml, body) = split_frontmatter("---\nmal_id: 1\n---\n\n# Title\n").unwrap();
        assert_eq!(yaml, "mal_id: 1");
        assert_eq!(body, "# Title\n");
        assert!(split_frontmatter("# no header").is_none());
        assert!(split_frontmatter("---\nunclosed").is_none());
    }

    #[test]
    fn test_missing_and_malformed() {
        assert_eq!(parse_frontmatter("plain text").unwrap(), None);
        assert!(matches!(
            parse_frontmatter("---\nmal_id: [1\n---\n"),
            Err(AnimelogError::Parse(_))
        ));
        let fm = parse_frontmatter("---\ntitle: x\n---\n").unwrap().unwrap();
        assert_eq!(fm.mal_id, None);
        assert!(fm.tags.is_empty());
    }
}

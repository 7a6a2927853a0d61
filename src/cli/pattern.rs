//! File-name patterns for `batch`: `*`, `?` and one level of `{a,b}` alternation.
//! Matching is ASCII case-insensitive so `*.jpg` also picks up `IMG_01.JPG`.
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::errors::AppError;

#[derive(Debug, Clone)]
pub struct Pattern {
    alternatives: Vec<Vec<char>>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidPattern {
            pattern: pattern.to_string(),
        };
        if pattern.is_empty() || pattern.contains('/') {
            return Err(invalid());
        }
        let alternatives = expand_braces(pattern).ok_or_else(invalid)?;
        Ok(Self {
            alternatives: alternatives
                .into_iter()
                .map(|alt| alt.to_ascii_lowercase().chars().collect())
                .collect(),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        let name: Vec<char> = name.to_ascii_lowercase().chars().collect();
        self.alternatives.iter().any(|alt| wildcard_match(alt, &name))
    }
}

/// Expand every `{a,b,...}` group into the cartesian product of alternatives.
/// Returns `None` on unbalanced or nested braces.
fn expand_braces(pattern: &str) -> Option<Vec<String>> {
    let Some(open) = pattern.find('{') else {
        return (!pattern.contains('}')).then(|| vec![pattern.to_string()]);
    };
    let close = open + pattern[open..].find('}')?;
    let body = &pattern[open + 1..close];
    if body.contains('{') || pattern[..open].contains('}') {
        return None;
    }
    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    let tails = expand_braces(tail)?;
    let mut out = Vec::new();
    for option in body.split(',') {
        for rest in &tails {
            out.push(format!("{}{}{}", head, option, rest));
        }
    }
    Some(out)
}

fn wildcard_match(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, n));
                p += 1;
            }
            Some('?') => {
                p += 1;
                n += 1;
            }
            Some(c) if *c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    p = sp + 1;
                    n = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

/// Files under `dir` whose names match, sorted. Subdirectories are only
/// visited when `recursive` is set.
pub fn collect_matches(
    dir: &Path,
    pattern: &Pattern,
    recursive: bool,
) -> std::io::Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && pattern.matches(&name) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn default_pattern_matches_accepted_images() {
        let p = Pattern::parse("*.{jpg,jpeg,png}").unwrap();
        assert!(p.matches("a.jpg"));
        assert!(p.matches("IMG_0001.JPEG"));
        assert!(p.matches("scan.png"));
        assert!(!p.matches("notes.txt"));
        assert!(!p.matches("a.jpg.bak"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let p = Pattern::parse("shot_??.png").unwrap();
        assert!(p.matches("shot_01.png"));
        assert!(!p.matches("shot_1.png"));
    }

    #[test]
    fn multiple_groups_expand() {
        let p = Pattern::parse("{a,b}_*.{png,jpg}").unwrap();
        assert!(p.matches("a_x.png"));
        assert!(p.matches("b_y.jpg"));
        assert!(!p.matches("c_y.jpg"));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert!(Pattern::parse("*.{jpg").is_err());
        assert!(Pattern::parse("*.jpg}").is_err());
        assert!(Pattern::parse("{a,{b}}").is_err());
        assert!(Pattern::parse("").is_err());
    }

    #[test]
    fn collect_respects_recursion() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.png"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("readme.md"), b"x").unwrap();
        fs::write(dir.path().join("nested/c.png"), b"x").unwrap();

        let p = Pattern::parse("*.{jpg,png}").unwrap();
        let flat = collect_matches(dir.path(), &p, false).unwrap();
        assert_eq!(flat, vec![dir.path().join("a.jpg"), dir.path().join("b.png")]);

        let deep = collect_matches(dir.path(), &p, true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&dir.path().join("nested/c.png")));
    }
}

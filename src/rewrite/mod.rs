use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// How a marker is matched against an input line.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Substring test against the raw line.
    Contains(String),
    /// Equality test against the whitespace-trimmed line.
    Exact(String),
}

impl Predicate {
    fn matches(&self, line: &str) -> bool {
        match self {
            Predicate::Contains(marker) => line.contains(marker.as_str()),
            Predicate::Exact(marker) => line.trim() == marker.as_str(),
        }
    }

    fn marker(&self) -> &str {
        match self {
            Predicate::Contains(marker) | Predicate::Exact(marker) => marker,
        }
    }
}

/// What happens to a line once its rule matched.
#[derive(Debug, Clone)]
pub enum Action {
    /// Copy the line to the primary output unchanged.
    Copy,
    /// Copy the line, then emit the injected lines right after it.
    CopyThenAppend(Vec<String>),
    /// Emit the injected lines, then copy the line after them.
    PrependThenCopy(Vec<String>),
    /// Route the line to the secondary output instead of the primary.
    Divert,
    /// Drop the line and emit the injected lines in its place.
    ReplaceWith(Vec<String>),
    /// Drop the line and every remaining input line.
    Stop,
}

/// An ordered (predicate, action) pair. Rules are evaluated top to bottom
/// per line and the first match wins; unmatched lines fall through to a
/// plain copy.
#[derive(Debug, Clone)]
pub struct MarkerRule {
    predicate: Predicate,
    action: Action,
    required: bool,
}

impl MarkerRule {
    pub fn contains(marker: impl Into<String>, action: Action) -> Self {
        MarkerRule {
            predicate: Predicate::Contains(marker.into()),
            action,
            required: false,
        }
    }

    pub fn exact(marker: impl Into<String>, action: Action) -> Self {
        MarkerRule {
            predicate: Predicate::Exact(marker.into()),
            action,
            required: false,
        }
    }

    /// A required rule that never matches makes the whole job fail instead
    /// of silently leaving the file unchanged.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The two output buffers produced by one rewrite pass. Line order within
/// each buffer matches input order; lines are never revisited.
#[derive(Debug, Default)]
pub struct Rewritten {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

/// One pass of the line-marker rewriter over one source. Built fresh per
/// call site, run once, discarded.
#[derive(Debug)]
pub struct RewriteJob {
    rules: Vec<MarkerRule>,
    footer: Option<String>,
}

impl RewriteJob {
    pub fn new(rules: Vec<MarkerRule>) -> Self {
        RewriteJob {
            rules,
            footer: None,
        }
    }

    /// Literal block appended once to the primary output after the input is
    /// consumed (or a stop rule fires).
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn run<'a, I>(&self, lines: I) -> Result<Rewritten>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = Rewritten::default();
        let mut matched = vec![false; self.rules.len()];

        'input: for line in lines {
            let rule = self
                .rules
                .iter()
                .enumerate()
                .find(|(_, rule)| rule.predicate.matches(line));

            match rule {
                None => out.primary.push(line.to_string()),
                Some((idx, rule)) => {
                    matched[idx] = true;
                    match &rule.action {
                        Action::Copy => out.primary.push(line.to_string()),
                        Action::CopyThenAppend(injected) => {
                            out.primary.push(line.to_string());
                            out.primary.extend(injected.iter().cloned());
                        }
                        Action::PrependThenCopy(injected) => {
                            out.primary.extend(injected.iter().cloned());
                            out.primary.push(line.to_string());
                        }
                        Action::Divert => out.secondary.push(line.to_string()),
                        Action::ReplaceWith(injected) => {
                            out.primary.extend(injected.iter().cloned());
                        }
                        Action::Stop => break 'input,
                    }
                }
            }
        }

        for (rule, hit) in self.rules.iter().zip(&matched) {
            if rule.required && !hit {
                bail!(
                    "marker '{}' not found in input",
                    rule.predicate.marker()
                );
            }
        }

        if let Some(footer) = &self.footer {
            out.primary
                .extend(footer.lines().map(|line| line.to_string()));
        }

        Ok(out)
    }

    /// Run the job over a file's lines. Persistence is the caller's job.
    pub fn run_on_file(&self, source: &Path) -> Result<Rewritten> {
        let contents = fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        self.run(contents.lines())
    }
}

/// Replace `target` with `lines`, going through a temp file in the same
/// directory and renaming it over the target. Not crash-atomic across the
/// write and the rename, which is acceptable for one-shot supervised use.
pub fn persist(target: &Path, lines: &[String]) -> Result<()> {
    let dir = target
        .parent()
        .with_context(|| format!("{} has no parent directory", target.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

    for line in lines {
        writeln!(temp, "{}", line)?;
    }
    temp.flush()?;

    temp.persist(target)
        .with_context(|| format!("Failed to replace {}", target.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(job: &RewriteJob, input: &[&str]) -> Rewritten {
        job.run(input.iter().copied()).unwrap()
    }

    #[test]
    fn test_lines_without_markers_pass_through() {
        let job = RewriteJob::new(vec![MarkerRule::contains(
            "NEEDLE",
            Action::Divert,
        )]);
        let input = ["first", "second", "third"];
        let out = run(&job, &input);

        assert_eq!(out.primary, vec!["first", "second", "third"]);
        assert!(out.secondary.is_empty());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let job = RewriteJob::new(vec![
            MarkerRule::contains("ab", Action::Divert),
            MarkerRule::contains("abc", Action::Stop),
        ]);
        let out = run(&job, &["abc", "tail"]);

        // "abc" matched the first rule, so the stop rule never fired.
        assert_eq!(out.secondary, vec!["abc"]);
        assert_eq!(out.primary, vec!["tail"]);
    }

    #[test]
    fn test_exact_predicate_trims_whitespace() {
        let job = RewriteJob::new(vec![MarkerRule::exact(
            "from django.urls import path",
            Action::ReplaceWith(vec!["from django.urls import path, include".to_string()]),
        )]);
        let out = run(
            &job,
            &["  from django.urls import path  ", "urlpatterns = ["],
        );

        assert_eq!(
            out.primary,
            vec!["from django.urls import path, include", "urlpatterns = ["]
        );
    }

    #[test]
    fn test_prepend_keeps_terminator_last() {
        let injected: Vec<String> = vec!["one".into(), "two".into(), "three".into()];
        let job = RewriteJob::new(vec![MarkerRule::contains(
            "]",
            Action::PrependThenCopy(injected),
        )]);
        let out = run(&job, &["head", "]"]);

        assert_eq!(out.primary, vec!["head", "one", "two", "three", "]"]);
    }

    #[test]
    fn test_stop_discards_remainder_and_appends_footer() {
        let job = RewriteJob::new(vec![MarkerRule::contains("CUT", Action::Stop)])
            .with_footer("footer line 1\nfooter line 2");
        let out = run(&job, &["kept", "CUT HERE", "discarded"]);

        assert_eq!(out.primary, vec!["kept", "footer line 1", "footer line 2"]);
    }

    #[test]
    fn test_footer_appended_without_stop() {
        let job = RewriteJob::new(vec![]).with_footer("tail");
        let out = run(&job, &["body"]);

        assert_eq!(out.primary, vec!["body", "tail"]);
    }

    #[test]
    fn test_copy_then_append_injects_after_match() {
        let job = RewriteJob::new(vec![MarkerRule::contains(
            "import os",
            Action::CopyThenAppend(vec!["from .mysecrets import SECRET_KEY, DEBUG".into()]),
        )]);
        let out = run(&job, &["import os", "BASE_DIR = here"]);

        assert_eq!(
            out.primary,
            vec![
                "import os",
                "from .mysecrets import SECRET_KEY, DEBUG",
                "BASE_DIR = here"
            ]
        );
    }

    #[test]
    fn test_required_marker_missing_is_an_error() {
        let job = RewriteJob::new(vec![
            MarkerRule::contains("INSTALLED_APPS", Action::Copy).required()
        ]);
        let err = job.run(["nothing relevant"]).unwrap_err();

        assert!(err.to_string().contains("INSTALLED_APPS"));
    }

    #[test]
    fn test_optional_marker_missing_is_fine() {
        let job = RewriteJob::new(vec![MarkerRule::contains("DEBUG", Action::Divert)]);
        let out = run(&job, &["plain"]);

        assert_eq!(out.primary, vec!["plain"]);
    }

    #[test]
    fn test_persist_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("settings.py");
        fs::write(&target, "old contents\n").unwrap();

        persist(&target, &["new line".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new line\n");
    }
}

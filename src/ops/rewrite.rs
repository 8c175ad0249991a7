//! Line-based manifest rewriting.
//!
//! Manifests are never parsed: sections are recognised by their header line
//! alone, matched at the very start of the line. A rewrite runs two passes
//! over the lines:
//!
//! 1. **Cleanup** drops every line a previous run inserted, so the content is
//!    back to what the user wrote.
//! 2. **Insertion** puts the dependency line right after the first
//!    `[dependencies]` header and the feature block right after the first
//!    `[features]` header. Without a `[features]` section one is created
//!    directly after the dependencies section, or at the end of the file when
//!    dependencies come last.
//!
//! Since cleanup undoes exactly what insertion adds, rewriting converges after
//! one run.
//!
//! ```text
//! [dependencies]                 [dependencies]
//! foo = "1"                      hotpath = { ... }
//! [dev-dependencies]     ──►     foo = "1"
//! bar = "2"
//!                                [features]
//!                                hotpath = [...]
//!                                ...
//!                                [dev-dependencies]
//!                                bar = "2"
//! ```

use crate::error::Result;
use crate::ops::directive::Directive;
use regex::Regex;

const DEPENDENCIES_HEADER: &str = "[dependencies]";
const FEATURES_HEADER: &str = "[features]";

/// What a rewrite managed to insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// The dependency line follows the first `[dependencies]` header.
    pub dependency_inserted: bool,
    /// The feature block is in place (always false without a block).
    pub features_inserted: bool,
    /// A `[features]` section had to be created for the block.
    pub features_created: bool,
}

impl RewriteReport {
    /// Returns true if every line the directive asks for was inserted.
    pub fn is_complete(&self, directive: &Directive) -> bool {
        self.dependency_inserted && (directive.features().is_none() || self.features_inserted)
    }
}

/// Result of rewriting one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub report: RewriteReport,
}

/// Applies one [`Directive`] to manifest content.
#[derive(Debug, Clone)]
pub struct Rewriter {
    directive: Directive,
    dependencies_header: Regex,
    features_header: Regex,
    section_header: Regex,
}

impl Rewriter {
    pub fn new(directive: Directive) -> Result<Self> {
        Ok(Self {
            directive,
            dependencies_header: header_pattern(DEPENDENCIES_HEADER)?,
            features_header: header_pattern(FEATURES_HEADER)?,
            section_header: Regex::new(r"^\[")?,
        })
    }

    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    /// Rewrites a whole manifest.
    ///
    /// Every kept line keeps its own terminator, so files with mixed `\n` and
    /// `\r\n` endings come back mixed. Inserted lines take the ending of the
    /// line they follow. A missing final newline stays missing.
    pub fn rewrite(&self, content: &str) -> Rewrite {
        let lines: Vec<Line<'_>> = content.split_inclusive('\n').map(Line::split).collect();
        let default_ending = lines
            .iter()
            .map(|line| line.ending)
            .find(|ending| !ending.is_empty())
            .unwrap_or("\n");

        let (new_lines, report) = self.rewrite_split(&lines, default_ending);

        let mut new_content = String::with_capacity(content.len() + 256);
        let last = new_lines.len().saturating_sub(1);
        for (idx, line) in new_lines.iter().enumerate() {
            new_content.push_str(&line.text);
            let ending = if line.ending.is_empty() {
                default_ending
            } else {
                line.ending
            };
            if idx < last || content.ends_with('\n') {
                new_content.push_str(ending);
            }
        }

        Rewrite {
            content: new_content,
            report,
        }
    }

    /// Rewrites a manifest given as lines without terminators.
    pub fn rewrite_lines<S: AsRef<str>>(&self, lines: &[S]) -> (Vec<String>, RewriteReport) {
        let lines: Vec<Line<'_>> = lines
            .iter()
            .map(|l| Line {
                text: l.as_ref(),
                ending: "\n",
            })
            .collect();

        let (new_lines, report) = self.rewrite_split(&lines, "\n");
        (new_lines.into_iter().map(|line| line.text).collect(), report)
    }

    fn rewrite_split<'l>(
        &self,
        lines: &[Line<'l>],
        default_ending: &'l str,
    ) -> (Vec<NewLine<'l>>, RewriteReport) {
        let cleaned = self.clean(lines);
        self.insert(&cleaned, default_ending)
    }

    /// Drops previously inserted lines and notes which headers exist.
    ///
    /// Dependency and non-blank feature lines are dropped wherever they occur.
    /// Blank lines are only dropped from the top of the first `[features]`
    /// section, where every block is inserted, including blanks left there by
    /// a different directive. Blank lines elsewhere survive.
    fn clean<'l>(&self, lines: &[Line<'l>]) -> Cleaned<'l> {
        let strips_blanks = self.directive.features().is_some();

        let mut cleaned = Cleaned {
            lines: Vec::with_capacity(lines.len()),
            dependencies_exists: false,
            features_exists: false,
        };
        // Between the first [features] header and its first kept entry.
        let mut at_features_top = false;

        for &line in lines {
            let text = line.text;
            if self.section_header.is_match(text) {
                at_features_top = false;
                if self.dependencies_header.is_match(text) {
                    cleaned.dependencies_exists = true;
                } else if self.features_header.is_match(text) && !cleaned.features_exists {
                    cleaned.features_exists = true;
                    at_features_top = strips_blanks;
                }
                cleaned.lines.push(line);
                continue;
            }

            if text.trim().is_empty() {
                if at_features_top {
                    log::trace!("Dropping blank line below [features]");
                    continue;
                }
                cleaned.lines.push(line);
                continue;
            }

            if self.directive.contains_line(text) {
                log::trace!("Dropping inserted line: {}", text);
                continue;
            }

            at_features_top = false;
            cleaned.lines.push(line);
        }

        cleaned
    }

    fn insert<'l>(
        &self,
        cleaned: &Cleaned<'l>,
        default_ending: &'l str,
    ) -> (Vec<NewLine<'l>>, RewriteReport) {
        // Both insertions hang off [dependencies]; without it nothing goes in.
        let block = self
            .directive
            .features()
            .filter(|_| cleaned.dependencies_exists);
        let extra = 3 + block.map_or(0, <[String]>::len);
        let mut out = Output {
            lines: Vec::with_capacity(cleaned.lines.len() + extra),
            default_ending,
        };
        let mut report = RewriteReport::default();

        for &line in &cleaned.lines {
            if self.dependencies_header.is_match(line.text) {
                out.keep(line);
                if !report.dependency_inserted {
                    out.add(self.directive.dependency());
                    report.dependency_inserted = true;
                }
                continue;
            }

            if let Some(block) = block {
                if self.features_header.is_match(line.text) && !report.features_inserted {
                    out.keep(line);
                    out.add_all(block);
                    report.features_inserted = true;
                    continue;
                }

                // First section after [dependencies] with no [features] anywhere.
                if self.section_header.is_match(line.text)
                    && report.dependency_inserted
                    && !cleaned.features_exists
                    && !report.features_inserted
                {
                    out.add_features_section(block);
                    report.features_inserted = true;
                    report.features_created = true;
                }
            }

            out.keep(line);
        }

        if let Some(block) = block {
            if report.dependency_inserted && !report.features_inserted {
                out.add_features_section(block);
                report.features_inserted = true;
                report.features_created = true;
            }
        }

        (out.lines, report)
    }
}

/// A manifest line and its terminator (`""` on an unterminated last line).
#[derive(Debug, Clone, Copy)]
struct Line<'l> {
    text: &'l str,
    ending: &'l str,
}

impl<'l> Line<'l> {
    fn split(raw: &'l str) -> Self {
        let text = match raw.strip_suffix('\n') {
            Some(body) => body.strip_suffix('\r').unwrap_or(body),
            None => raw,
        };
        Self {
            text,
            ending: &raw[text.len()..],
        }
    }
}

struct Cleaned<'l> {
    lines: Vec<Line<'l>>,
    dependencies_exists: bool,
    features_exists: bool,
}

struct NewLine<'l> {
    text: String,
    ending: &'l str,
}

struct Output<'l> {
    lines: Vec<NewLine<'l>>,
    default_ending: &'l str,
}

impl<'l> Output<'l> {
    fn keep(&mut self, line: Line<'l>) {
        self.lines.push(NewLine {
            text: line.text.to_string(),
            ending: line.ending,
        });
    }

    /// Appends an inserted line, terminated like the line before it.
    fn add(&mut self, text: &str) {
        let ending = self
            .lines
            .last()
            .map(|line| line.ending)
            .filter(|ending| !ending.is_empty())
            .unwrap_or(self.default_ending);
        self.lines.push(NewLine {
            text: text.to_string(),
            ending,
        });
    }

    fn add_all(&mut self, block: &[String]) {
        for line in block {
            self.add(line);
        }
    }

    fn add_features_section(&mut self, block: &[String]) {
        self.add("");
        self.add(FEATURES_HEADER);
        self.add_all(block);
    }
}

/// Matches `header` at the very start of a line, trailing text allowed.
fn header_pattern(header: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^{}", regex::escape(header)))?)
}

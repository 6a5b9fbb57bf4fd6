//! Deterministic answer composition from retrieved chunks.
//!
//! Rules are tried in order; the first one whose predicate matches supplies
//! the answer. When none match, the synthesizer falls back to a short
//! bulleted preview of the best chunks.

use tracing::debug;

use ragqa_core::config::{AnswerSettings, RuleSettings};

pub const FALLBACK_BANNER: &str = "Here is the relevant information found:\n";

const FALLBACK_CHUNKS: usize = 2;

pub const RESUME_ANALYZER_ANSWER: &str = "The Resume Analyzer is a Flask-based web application that allows users \
to upload resumes and compare them with job descriptions. \
It extracts skills from resumes, calculates a match score, \
and highlights missing skills to help improve job fit.";

/// What a rule gets to look at. Both lower-cased views are precomputed once
/// per question.
#[derive(Debug, Clone)]
pub struct AnswerContext<'a> {
    pub question: &'a str,
    pub question_lower: String,
    pub context_lower: String,
    pub chunks: &'a [&'a str],
}

impl<'a> AnswerContext<'a> {
    pub fn new(question: &'a str, chunks: &'a [&'a str]) -> Self {
        Self {
            question,
            question_lower: question.to_lowercase(),
            context_lower: chunks.join(" ").to_lowercase(),
            chunks,
        }
    }
}

pub trait AnswerRule: Send + Sync {
    fn name(&self) -> &str;
    fn matches(&self, ctx: &AnswerContext<'_>) -> bool;
    fn respond(&self, ctx: &AnswerContext<'_>) -> String;
}

/// Case-insensitive keyword rule with a fixed response.
///
/// Matches when the question contains any of `question_any` (an empty list
/// accepts every question) and the retrieved text contains all of
/// `context_all`.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    name: String,
    question_any: Vec<String>,
    context_all: Vec<String>,
    template: String,
}

impl KeywordRule {
    pub fn new(name: impl Into<String>, question_any: &[&str], context_all: &[&str], template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            question_any: question_any.iter().map(|s| s.to_lowercase()).collect(),
            context_all: context_all.iter().map(|s| s.to_lowercase()).collect(),
            template: template.into(),
        }
    }
}

impl From<&RuleSettings> for KeywordRule {
    fn from(s: &RuleSettings) -> Self {
        Self {
            name: s.name.clone(),
            question_any: s.question_any.iter().map(|k| k.to_lowercase()).collect(),
            context_all: s.context_all.iter().map(|k| k.to_lowercase()).collect(),
            template: s.template.clone(),
        }
    }
}

impl AnswerRule for KeywordRule {
    fn name(&self) -> &str { &self.name }

    fn matches(&self, ctx: &AnswerContext<'_>) -> bool {
        let question_ok = self.question_any.is_empty() || self.question_any.iter().any(|k| ctx.question_lower.contains(k.as_str()));
        question_ok && self.context_all.iter().all(|k| ctx.context_lower.contains(k.as_str()))
    }

    fn respond(&self, _ctx: &AnswerContext<'_>) -> String { self.template.clone() }
}

pub fn builtin_rules() -> Vec<Box<dyn AnswerRule>> {
    vec![Box::new(KeywordRule::new("resume-analyzer", &["resume analyzer", "resume"], &["flask"], RESUME_ANALYZER_ANSWER))]
}

pub struct AnswerSynthesizer {
    rules: Vec<Box<dyn AnswerRule>>,
}

impl Default for AnswerSynthesizer {
    fn default() -> Self { Self::with_builtin_rules() }
}

impl AnswerSynthesizer {
    pub fn new(rules: Vec<Box<dyn AnswerRule>>) -> Self { Self { rules } }

    pub fn with_builtin_rules() -> Self { Self::new(builtin_rules()) }

    /// Built-in rules (unless disabled) followed by the configured ones.
    pub fn from_settings(settings: &AnswerSettings) -> Self {
        let mut rules = if settings.builtin_rules { builtin_rules() } else { Vec::new() };
        rules.extend(settings.rules.iter().map(|r| Box::new(KeywordRule::from(r)) as Box<dyn AnswerRule>));
        Self::new(rules)
    }

    /// Append a rule at the lowest priority.
    pub fn push_rule(&mut self, rule: Box<dyn AnswerRule>) { self.rules.push(rule); }

    pub fn rule_names(&self) -> Vec<&str> { self.rules.iter().map(|r| r.name()).collect() }

    pub fn synthesize(&self, question: &str, chunks: &[&str], max_preview: usize) -> String {
        let ctx = AnswerContext::new(question, chunks);
        if let Some(rule) = self.rules.iter().find(|r| r.matches(&ctx)) {
            debug!(rule = rule.name(), "answer rule matched");
            return rule.respond(&ctx);
        }
        debug!("no answer rule matched; using fallback");
        fallback(chunks, max_preview)
    }
}

fn fallback(chunks: &[&str], max_preview: usize) -> String {
    let mut summary = String::from(FALLBACK_BANNER);
    for chunk in chunks.iter().take(FALLBACK_CHUNKS) {
        let preview: String = chunk.chars().take(max_preview).collect();
        summary.push_str(&format!("- {preview}...\n"));
    }
    summary
}

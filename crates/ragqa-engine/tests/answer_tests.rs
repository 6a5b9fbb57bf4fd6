use ragqa_core::config::{AnswerSettings, RuleSettings};
use ragqa_engine::answer::{AnswerContext, FALLBACK_BANNER, RESUME_ANALYZER_ANSWER};
use ragqa_engine::{AnswerRule, AnswerSynthesizer, KeywordRule};

#[test]
fn resume_question_with_flask_context_uses_template() {
    let synth = AnswerSynthesizer::with_builtin_rules();
    let chunks = ["Repository: resume-analyzer\nFile: app.py\nfrom flask import Flask", "unrelated"];
    let answer = synth.synthesize("What does the Resume Analyzer project do?", &chunks, 200);
    assert_eq!(answer, RESUME_ANALYZER_ANSWER);

    // "resume" alone is enough, and matching ignores case
    let answer = synth.synthesize("tell me about my RESUME tool", &["Built with FLASK"], 200);
    assert_eq!(answer, RESUME_ANALYZER_ANSWER);
}

#[test]
fn resume_question_without_flask_falls_back() {
    let synth = AnswerSynthesizer::with_builtin_rules();
    let long = "a".repeat(450);
    let chunks = [long.as_str(), "second chunk", "third chunk"];
    let answer = synth.synthesize("What does the Resume Analyzer do?", &chunks, 200);

    assert!(answer.starts_with(FALLBACK_BANNER));
    let bullets: Vec<&str> = answer.lines().filter(|l| l.starts_with("- ")).collect();
    assert_eq!(bullets.len(), 2, "at most two previews");
    assert_eq!(bullets[0], format!("- {}...", "a".repeat(200)));
    assert_eq!(bullets[1], "- second chunk...");
    assert!(!answer.contains("third chunk"));
}

#[test]
fn flask_context_without_resume_question_falls_back() {
    let synth = AnswerSynthesizer::with_builtin_rules();
    let answer = synth.synthesize("Which web framework is used?", &["flask app"], 200);
    assert_eq!(answer, format!("{FALLBACK_BANNER}- flask app...\n"));
}

#[test]
fn fallback_truncates_by_characters() {
    let synth = AnswerSynthesizer::new(Vec::new());
    let answer = synth.synthesize("q", &["ééééé"], 3);
    assert_eq!(answer, format!("{FALLBACK_BANNER}- ééé...\n"));

    let answer = synth.synthesize("q", &[], 3);
    assert_eq!(answer, FALLBACK_BANNER);
}

#[test]
fn first_matching_rule_wins() {
    let mut synth = AnswerSynthesizer::new(vec![
        Box::new(KeywordRule::new("cctv", &["cctv"], &["surveillance"], "cctv answer")),
        Box::new(KeywordRule::new("any-surveillance", &[], &["surveillance"], "generic answer")),
    ]);
    synth.push_rule(Box::new(KeywordRule::new("late", &[], &[], "never reached when earlier rules match")));

    assert_eq!(synth.synthesize("How does CCTV work?", &["Surveillance systems"], 200), "cctv answer");
    assert_eq!(synth.synthesize("What is this?", &["surveillance"], 200), "generic answer");
    assert_eq!(synth.synthesize("What is this?", &["cooking"], 200), "never reached when earlier rules match");
    assert_eq!(synth.rule_names(), vec!["cctv", "any-surveillance", "late"]);
}

#[test]
fn rules_from_settings_follow_builtins() {
    let settings = AnswerSettings {
        builtin_rules: true,
        rules: vec![RuleSettings {
            name: "violence".into(),
            question_any: vec!["Violence".into()],
            context_all: vec!["CNN".into(), "lstm".into()],
            template: "Violence detection uses CNN and LSTM models.".into(),
        }],
    };
    let synth = AnswerSynthesizer::from_settings(&settings);
    assert_eq!(synth.rule_names(), vec!["resume-analyzer", "violence"]);
    let answer = synth.synthesize("how is violence detected?", &["models like cnn and LSTM"], 200);
    assert_eq!(answer, "Violence detection uses CNN and LSTM models.");

    let synth = AnswerSynthesizer::from_settings(&AnswerSettings { builtin_rules: false, rules: Vec::new() });
    assert!(synth.rule_names().is_empty());
}

struct EchoRule;

impl AnswerRule for EchoRule {
    fn name(&self) -> &str { "echo" }
    fn matches(&self, ctx: &AnswerContext<'_>) -> bool { ctx.question_lower.starts_with("echo") }
    fn respond(&self, ctx: &AnswerContext<'_>) -> String { format!("{} ({} chunks)", ctx.question, ctx.chunks.len()) }
}

#[test]
fn custom_rules_plug_in() {
    let mut synth = AnswerSynthesizer::with_builtin_rules();
    synth.push_rule(Box::new(EchoRule));
    assert_eq!(synth.synthesize("Echo me", &["a", "b"], 200), "Echo me (2 chunks)");
}

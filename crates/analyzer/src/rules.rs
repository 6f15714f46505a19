//! The individual diagnostic rules.
//!
//! Each rule is a stateless predicate plus formatter. Rules see the question
//! through a [`Prepared`] view so case folding and word counting happen once
//! per analysis rather than once per rule.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Category, Finding};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

static CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(and|or)\b"));

static LEADING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bdon't you think\b",
        r"\bisn't it true\b",
        r"\bwouldn't you agree\b",
        r"\bof course\b",
        r"\bobviously\b",
        r"\bclearly\b",
        r"\beveryone knows\b",
        r"\bmost people\b",
        r"\bshould\b.*\b(agree|think|believe)\b",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static VAGUE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\boften\b",
        r"\busually\b",
        r"\bsometimes\b",
        r"\brarely\b",
        r"\brecently\b",
        r"\ba lot\b",
        r"\bregularly\b",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static TEMPORAL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(past|last|current|this|previous|ago|week|month|year|days)\b")
});

static NEGATION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(not|never|no|none|neither|nor)\b"));

/// Maximum words before a question is considered too long.
pub const MAX_WORDS: usize = 30;

/// Questions this short are never flagged for a missing reference period.
pub const REFERENCE_PERIOD_MIN_WORDS: usize = 5;

/// The question text as the rules see it.
#[derive(Debug, Clone)]
pub struct Prepared<'a> {
    pub original: &'a str,
    pub lowered: String,
    pub word_count: usize,
}

impl<'a> Prepared<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            original: text,
            lowered: text.to_lowercase(),
            word_count: text.split_whitespace().count(),
        }
    }
}

/// A single diagnostic check.
pub trait Rule: Send + Sync {
    fn category(&self) -> Category;

    /// Return at most one finding for the question.
    fn check(&self, question: &Prepared<'_>) -> Option<Finding>;
}

/// Two or more of "and"/"or", or more than one question mark.
pub struct DoubleBarreled;

impl Rule for DoubleBarreled {
    fn category(&self) -> Category {
        Category::DoubleBarreled
    }

    fn check(&self, question: &Prepared<'_>) -> Option<Finding> {
        let conjunctions = CONJUNCTION.find_iter(&question.lowered).count();
        let question_marks = question.original.matches('?').count();
        (conjunctions >= 2 || question_marks > 1).then(|| {
            Finding::new(
                self.category(),
                "Looks like this asks about more than one thing. When you join concepts \
                 with 'and' or 'or', respondents have to pick one to answer about. Split it.",
            )
        })
    }
}

pub struct TooLong;

impl Rule for TooLong {
    fn category(&self) -> Category {
        Category::TooLong
    }

    fn check(&self, question: &Prepared<'_>) -> Option<Finding> {
        (question.word_count > MAX_WORDS).then(|| {
            Finding::new(
                self.category(),
                format!(
                    "{} words. Past 25 or 30, respondents start skimming. Move background \
                     info into a stem or instruction block and keep the question itself short.",
                    question.word_count
                ),
            )
        })
    }
}

/// Fires once, on the first leading pattern that matches.
pub struct Leading;

impl Rule for Leading {
    fn category(&self) -> Category {
        Category::Leading
    }

    fn check(&self, question: &Prepared<'_>) -> Option<Finding> {
        LEADING
            .iter()
            .find(|re| re.is_match(&question.lowered))
            .map(|_| {
                Finding::new(
                    self.category(),
                    "There is evaluative language here that tips the respondent toward a \
                     particular answer. Strip it out. The response scale does the work of \
                     capturing their position.",
                )
            })
    }
}

/// Collects every vague term present, in list order.
pub struct VagueFrequency;

impl VagueFrequency {
    pub fn terms(question: &Prepared<'_>) -> Vec<String> {
        VAGUE
            .iter()
            .filter_map(|re| re.find(&question.lowered))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Rule for VagueFrequency {
    fn category(&self) -> Category {
        Category::VagueFrequency
    }

    fn check(&self, question: &Prepared<'_>) -> Option<Finding> {
        let found = Self::terms(question);
        if found.is_empty() {
            return None;
        }
        Some(Finding::new(
            self.category(),
            format!(
                "'{}' means something different to every respondent. Replace with a \
                 concrete time frame ('in the past 7 days', 'once a week or more') or put \
                 frequency into the response options.",
                found.join(", ")
            ),
        ))
    }
}

pub struct NoReferencePeriod;

impl Rule for NoReferencePeriod {
    fn category(&self) -> Category {
        Category::NoReferencePeriod
    }

    fn check(&self, question: &Prepared<'_>) -> Option<Finding> {
        if question.word_count <= REFERENCE_PERIOD_MIN_WORDS || TEMPORAL.is_match(&question.lowered)
        {
            return None;
        }
        Some(Finding::new(
            self.category(),
            "There is no time frame here. One respondent answers about today, another \
             about the past five years, and you cannot compare them. Add something like \
             'in the past month' or 'in your current job'.",
        ))
    }
}

pub struct DoubleNegative;

impl Rule for DoubleNegative {
    fn category(&self) -> Category {
        Category::DoubleNegative
    }

    fn check(&self, question: &Prepared<'_>) -> Option<Finding> {
        (NEGATION.find_iter(&question.lowered).count() >= 2).then(|| {
            Finding::new(
                self.category(),
                "Two negations and respondents lose track of which direction they are \
                 answering in. Rephrase with positive wording or at most one negation.",
            )
        })
    }
}

/// The built-in rules in evaluation order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DoubleBarreled),
        Box::new(TooLong),
        Box::new(Leading),
        Box::new(VagueFrequency),
        Box::new(NoReferencePeriod),
        Box::new(DoubleNegative),
    ]
}

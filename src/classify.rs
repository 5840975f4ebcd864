//! Rule-based record classification.
//!
//! Classification walks an ordered rule table and returns the category of
//! the first rule with a keyword match; [`Category::Other`] is the fallback.
//! Matching is case-insensitive substring membership over title + summary.
//! Rule order is significant: a record matching several rules always gets
//! the earliest-declared category. The function is pure and total.

use crate::models::{Category, NormalizedRecord};

/// One classification rule: a category and the keywords that select it.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

/// The built-in rule table, in evaluation order.
pub static RULES: &[Rule] = &[
    Rule {
        category: Category::LearningSkills,
        keywords: &[
            "ai",
            "coding",
            "programming",
            "notes",
            "exam",
            "study",
            "machine learning",
            "python",
            "deep learning",
            "skill",
        ],
    },
    Rule {
        category: Category::CareerProductivity,
        keywords: &[
            "career",
            "job",
            "productivity",
            "resume",
            "interview",
            "time management",
            "work",
            "focus",
        ],
    },
    Rule {
        category: Category::MotivationMindset,
        keywords: &[
            "motivation",
            "mindset",
            "inspiration",
            "discipline",
            "success",
            "confidence",
            "habit",
        ],
    },
    Rule {
        category: Category::ToolsResources,
        keywords: &[
            "tools",
            "apps",
            "websites",
            "resources",
            "ai tools",
            "extensions",
            "software",
        ],
    },
];

/// Classify a record with the built-in rule table.
pub fn classify(record: &NormalizedRecord) -> Category {
    classify_with(RULES, &record.title, &record.summary)
}

/// Classify against an explicit rule slice. First matching rule wins;
/// no match falls through to [`Category::Other`].
pub fn classify_with(rules: &[Rule], title: &str, summary: &str) -> Category {
    let text = format!("{title} {summary}").to_lowercase();
    for rule in rules {
        if rule.keywords.iter().any(|keyword| text.contains(*keyword)) {
            return rule.category;
        }
    }
    Category::Other
}

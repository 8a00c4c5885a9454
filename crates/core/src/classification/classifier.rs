//! Keyword classifier for foreign calendar events.
//!
//! Titles are lowercased and checked against an ordered rule table; the first
//! rule with a matching keyword decides the tag. Keywords match whole words
//! only (a trailing plural `s` is allowed), so "call" does not fire on
//! "Recall". Rules are checked in the following order:
//! 1. Meeting
//! 2. Personal
//! 3. Focus / work block
//! 4. Travel
//!
//! Anything else is tagged [`EventTag::Default`].

use cadence_domain::EventTag;

/// Tag assigned when any of `keywords` occurs in a title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRule {
    pub tag: EventTag,
    pub keywords: &'static [&'static str],
}

/// Built-in rule table. Keywords are lowercase.
pub const DEFAULT_RULES: &[KeywordRule] = &[
    KeywordRule {
        tag: EventTag::Meeting,
        keywords: &[
            "meeting",
            "reunião",
            "reuniao",
            "standup",
            "stand-up",
            "1:1",
            "call",
            "sync",
            "interview",
            "webinar",
            "conference",
        ],
    },
    KeywordRule {
        tag: EventTag::Personal,
        keywords: &[
            "personal",
            "pessoal",
            "lunch",
            "almoço",
            "gym",
            "academia",
            "family",
            "família",
            "birthday",
            "aniversário",
            "vacation",
            "férias",
        ],
    },
    KeywordRule {
        tag: EventTag::Focus,
        keywords: &["focus", "foco", "deep work", "work block", "study", "estudo", "writing"],
    },
    KeywordRule {
        tag: EventTag::Travel,
        keywords: &["travel", "viagem", "flight", "voo", "trip", "airport", "aeroporto", "train"],
    },
];

/// Deterministic title classifier
#[derive(Debug, Clone, Copy)]
pub struct EventClassifier {
    rules: &'static [KeywordRule],
}

impl EventClassifier {
    #[must_use]
    pub fn new(rules: &'static [KeywordRule]) -> Self {
        Self { rules }
    }

    /// Tag for `title`; first matching rule wins.
    #[must_use]
    pub fn classify(&self, title: &str) -> EventTag {
        let normalized = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| contains_word(&normalized, keyword)))
            .map_or(EventTag::Default, |rule| rule.tag)
    }
}

/// `keyword` occurs in `text` delimited by non-alphanumeric characters or the
/// ends of the string.
fn contains_word(text: &str, keyword: &str) -> bool {
    let is_boundary = |c: Option<char>| !c.is_some_and(char::is_alphanumeric);
    text.match_indices(keyword).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let mut rest = text[start + matched.len()..].chars();
        let after = rest.next();
        is_boundary(before) && (is_boundary(after) || (after == Some('s') && is_boundary(rest.next())))
    })
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RULES)
    }
}

/// Classify with the built-in rule table.
#[must_use]
pub fn classify_title(title: &str) -> EventTag {
    EventClassifier::default().classify(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_meeting_is_a_meeting() {
        assert_eq!(classify_title("Team Meeting"), EventTag::Meeting);
    }

    #[test]
    fn unknown_title_falls_back_to_default() {
        assert_eq!(classify_title("Dentist"), EventTag::Default);
        assert_eq!(classify_title(""), EventTag::Default);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(classify_title("FLIGHT TO LISBON"), EventTag::Travel);
        assert_eq!(classify_title("Deep Work"), EventTag::Focus);
        assert_eq!(classify_title("Almoço com a família"), EventTag::Personal);
    }

    #[test]
    fn earlier_rule_wins_when_several_match() {
        // "call" (meeting) and "family" (personal) both occur
        assert_eq!(classify_title("Family call"), EventTag::Meeting);
        // "lunch" (personal) beats "trip" (travel)
        assert_eq!(classify_title("Lunch before trip"), EventTag::Personal);
    }

    #[test]
    fn keywords_only_match_whole_words() {
        assert_eq!(classify_title("Recall campaign"), EventTag::Default);
        assert_eq!(classify_title("Async review"), EventTag::Default);
        assert_eq!(classify_title("Training day"), EventTag::Default);
        assert_eq!(classify_title("Sales calls"), EventTag::Meeting);
        assert_eq!(classify_title("Train to Porto"), EventTag::Travel);
        assert_eq!(classify_title("Sync: roadmap"), EventTag::Meeting);
        assert_eq!(classify_title("1:1 with Rui"), EventTag::Meeting);
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let classifier = EventClassifier::default();
        let first = classifier.classify("Weekly sync with design");
        for _ in 0..10 {
            assert_eq!(classifier.classify("Weekly sync with design"), first);
        }
    }

    #[test]
    fn custom_rule_table_is_honored() {
        const RULES: &[KeywordRule] =
            &[KeywordRule { tag: EventTag::Focus, keywords: &["session"] }];
        let classifier = EventClassifier::new(RULES);
        assert_eq!(classifier.classify("Session review"), EventTag::Focus);
        assert_eq!(classifier.classify("Team Meeting"), EventTag::Default);
    }
}

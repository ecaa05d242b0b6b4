//! Free-text moderation. The lifecycle engine only sees the
//! [`ProfanityFilter`] predicate; the word list is an implementation detail.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Pure predicate over free text.
pub trait ProfanityFilter: Send + Sync {
    fn is_profane(&self, text: &str) -> bool;
}

static BUILTIN_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "arse", "arsehole", "asshole", "bastard", "bitch", "bollocks", "bullshit", "cock",
        "crap", "cunt", "dick", "dickhead", "douche", "fag", "faggot", "fuck", "fucked",
        "fucker", "fucking", "motherfucker", "nigga", "nigger", "piss", "prick", "pussy",
        "retard", "shit", "shitty", "slut", "twat", "wanker", "whore",
    ]
    .into_iter()
    .collect()
});

/// Whole-word, case-insensitive match against the built-in list plus
/// configured extras.
#[derive(Debug, Clone, Default)]
pub struct WordListFilter {
    extra: HashSet<String>,
}

impl WordListFilter {
    pub fn new<I, S>(extra_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: extra_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    fn is_listed(&self, word: &str) -> bool {
        BUILTIN_WORDS.contains(word) || self.extra.contains(word)
    }
}

impl ProfanityFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .any(|w| self.is_listed(&w.to_lowercase()))
    }
}

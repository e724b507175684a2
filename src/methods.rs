//! The fixed study-method catalog.
//!
//! Methods are static reference data: the scorer accumulates points into this
//! set, and the seed step inserts them into the `methods` table. Declaration
//! order is the documented tie-break order for recommendations — a stable
//! sort by score keeps earlier-declared methods ahead on equal scores.

/// A study method definition. `id` matches the seeded `methods.id` column.
pub struct MethodDef {
    pub id: i64,
    pub name: &'static str,
    pub description: &'static str,
}

pub const METHODS: [MethodDef; 4] = [
    MethodDef {
        id: 1,
        name: "pomodoro",
        description: "Time management in focused 25-minute blocks",
    },
    MethodDef {
        id: 2,
        name: "feynman",
        description: "Learning by explaining concepts in simple words",
    },
    MethodDef {
        id: 3,
        name: "cornell",
        description: "Structured note-taking with cues and summaries",
    },
    MethodDef {
        id: 4,
        name: "flashcards",
        description: "Memory cards with spaced repetition",
    },
];

/// Canonical name for a method id, or `None` for an id outside the catalog.
pub fn method_name(id: i64) -> Option<&'static str> {
    METHODS.iter().find(|m| m.id == id).map(|m| m.name)
}

pub fn method_id(name: &str) -> Option<i64> {
    METHODS.iter().find(|m| m.name == name).map(|m| m.id)
}

// ─── Guides ───────────────────────────────────────────────────────────────────

/// Practical guidance shown alongside a diagnostic recommendation.
pub struct MethodGuide {
    pub title: &'static str,
    pub description: &'static str,
    pub tips: &'static [&'static str],
    pub best_for: &'static str,
}

/// The guide for a method name. Falls back to the Pomodoro guide for an
/// unknown name so the diagnostic result always carries usable advice.
pub fn guide_for(name: &str) -> &'static MethodGuide {
    match name {
        "feynman" => &FEYNMAN_GUIDE,
        "cornell" => &CORNELL_GUIDE,
        "flashcards" => &FLASHCARDS_GUIDE,
        _ => &POMODORO_GUIDE,
    }
}

static POMODORO_GUIDE: MethodGuide = MethodGuide {
    title: "Pomodoro Technique",
    description: "Time management in focused 25-minute blocks",
    tips: &[
        "Study in 25-minute blocks (pomodoros)",
        "Take 5-minute breaks between pomodoros",
        "After 4 pomodoros, rest for 15-30 minutes",
        "Use a timer and remove distractions",
    ],
    best_for: "Focus and productivity",
};

static FEYNMAN_GUIDE: MethodGuide = MethodGuide {
    title: "Feynman Technique",
    description: "Learning by explaining concepts in simple words",
    tips: &[
        "Pick a concept and explain it out loud",
        "Use simple language, as if teaching a child",
        "Notice where you get stuck — that is what you don't understand yet",
        "Go back to the material and fill those gaps",
        "Repeat until the explanation flows",
    ],
    best_for: "Deep understanding of concepts",
};

static CORNELL_GUIDE: MethodGuide = MethodGuide {
    title: "Cornell Method",
    description: "Structured note-taking with cues and summaries",
    tips: &[
        "Split the page: notes (right), cue words (left), summary (bottom)",
        "Take notes in the main section during class",
        "Write keywords and questions in the cue column",
        "Summarise the whole page at the end",
        "Review by covering the notes and answering from the cues",
    ],
    best_for: "Organisation and effective review",
};

static FLASHCARDS_GUIDE: MethodGuide = MethodGuide {
    title: "Flashcards",
    description: "Memory cards with spaced repetition",
    tips: &[
        "Make cards with the question on the front, answer on the back",
        "Review new cards daily",
        "Sort into piles: easy, medium, hard",
        "Review the hard pile more often",
        "Apps like Anki or Quizlet can automate the scheduling",
    ],
    best_for: "Memorisation and long-term retention",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_names_round_trip() {
        for m in &METHODS {
            assert_eq!(method_name(m.id), Some(m.name));
            assert_eq!(method_id(m.name), Some(m.id));
        }
        assert_eq!(method_name(99), None);
        assert_eq!(method_id("osmosis"), None);
    }

    #[test]
    fn every_method_has_a_guide() {
        for m in &METHODS {
            let guide = guide_for(m.name);
            assert!(!guide.tips.is_empty());
            assert!(!guide.best_for.is_empty());
        }
    }
}

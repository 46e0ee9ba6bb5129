//! Keyword-based topical categorization of summaries.
//!
//! Pure and total: any input maps to a non-empty label string. Categories
//! are an explicit ordered table because the output order of multi-label
//! results is part of the observable contract, not an accident of map
//! iteration.

/// Ordered category table: `(label, trigger phrases)`.
///
/// Triggers are matched verbatim as substrings of the lowercased summary.
/// Matching is not word-boundary aware, so a trigger that happens to be a
/// substring of an unrelated word will also fire ("space" inside
/// "spacecraft" is wanted; shorter tokens carry the same risk).
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Quantum Physics",
        &[
            "quantum",
            "superposition",
            "entanglement",
            "quantum mechanics",
            "particles",
            "wave function",
        ],
    ),
    (
        "Space",
        &[
            "space",
            "astronomy",
            "cosmology",
            "galaxy",
            "universe",
            "black hole",
            "planets",
            "stars",
            "astrophysics",
        ],
    ),
    (
        "Computing",
        &[
            "computing",
            "algorithm",
            "processor",
            "AI",
            "artificial intelligence",
            "machine learning",
            "quantum computing",
            "data science",
            "neural networks",
        ],
    ),
    (
        "Biology",
        &[
            "biology",
            "genetics",
            "evolution",
            "ecology",
            "microbiology",
            "molecular biology",
            "biotechnology",
        ],
    ),
    (
        "Medicine",
        &[
            "medicine",
            "health",
            "disease",
            "treatment",
            "surgery",
            "pharmacology",
            "neuroscience",
            "mental health",
            "clinical trials",
        ],
    ),
    (
        "Physics",
        &[
            "physics",
            "relativity",
            "thermodynamics",
            "field theory",
            "energy",
            "gravity",
            "electromagnetism",
        ],
    ),
    (
        "Chemistry",
        &[
            "chemistry",
            "molecule",
            "reaction",
            "organic chemistry",
            "inorganic chemistry",
            "biochemistry",
            "chemical",
            "catalyst",
        ],
    ),
    (
        "Engineering",
        &[
            "engineering",
            "mechanical engineering",
            "electrical engineering",
            "civil engineering",
            "software engineering",
            "robotics",
            "nanotechnology",
        ],
    ),
    (
        "Environment",
        &[
            "environment",
            "climate change",
            "sustainability",
            "ecology",
            "conservation",
            "biodiversity",
            "pollution",
        ],
    ),
    (
        "Economics",
        &[
            "economics",
            "finance",
            "market",
            "trade",
            "investment",
            "economy",
            "recession",
            "inflation",
        ],
    ),
    (
        "Social Sciences",
        &[
            "sociology",
            "psychology",
            "anthropology",
            "political science",
            "education",
            "human behavior",
        ],
    ),
    (
        "Technology",
        &[
            "technology",
            "innovation",
            "internet",
            "cybersecurity",
            "blockchain",
            "virtual reality",
            "augmented reality",
        ],
    ),
];

/// Fallback label when no category trigger matches.
const FALLBACK: &str = "General";

/// Map a summary to its category labels, joined with `", "` in table order.
///
/// A summary can legitimately receive several labels; an unmatched summary
/// gets exactly `"General"`.
pub fn categorize(summary: &str) -> String {
    let lowered = summary.to_lowercase();

    let matched: Vec<&str> = CATEGORIES
        .iter()
        .filter(|(_, triggers)| triggers.iter().any(|t| lowered.contains(t)))
        .map(|(label, _)| *label)
        .collect();

    if matched.is_empty() {
        FALLBACK.to_string()
    } else {
        matched.join(", ")
    }
}

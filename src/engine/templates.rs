//! Fixed checkpoint templates. `{topic}` is replaced with the subtopic title.

use super::question_gen::Difficulty;

pub(crate) const TOPIC_PLACEHOLDER: &str = "{topic}";

pub(crate) struct McqTemplate {
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub correct: usize,
}

pub(crate) struct ShortAnswerTemplate {
    pub prompt: &'static str,
    pub acceptable: &'static [&'static str],
}

const MCQ_EASY: &[McqTemplate] = &[
    McqTemplate {
        prompt: "What is the main idea of {topic}?",
        options: [
            "The core concept explained in the reading",
            "An unrelated historical detail",
            "A formatting convention",
            "None of the material covered",
        ],
        correct: 0,
    },
    McqTemplate {
        prompt: "Which statement about {topic} is true?",
        options: [
            "It has no practical use",
            "It builds on the definitions introduced in the reading",
            "It contradicts every earlier section",
            "It only applies to edge cases",
        ],
        correct: 1,
    },
    McqTemplate {
        prompt: "Which term is most closely associated with {topic}?",
        options: [
            "An unrelated buzzword",
            "A term from a different subject",
            "The key term defined in the reading",
            "A random abbreviation",
        ],
        correct: 2,
    },
];

const MCQ_MEDIUM: &[McqTemplate] = &[
    McqTemplate {
        prompt: "How would you apply {topic} to a new problem?",
        options: [
            "Ignore the problem constraints",
            "Identify the relevant concept and follow its steps",
            "Memorise the example verbatim",
            "Skip straight to the answer",
        ],
        correct: 1,
    },
    McqTemplate {
        prompt: "Which example best illustrates {topic} in practice?",
        options: [
            "A scenario where the concept is applied to reach a result",
            "A scenario unrelated to the reading",
            "A definition with no context",
            "A list of unrelated facts",
        ],
        correct: 0,
    },
    McqTemplate {
        prompt: "What is a common mistake when using {topic}?",
        options: [
            "Checking the assumptions first",
            "Reading the problem carefully",
            "Applying it without checking its assumptions",
            "Comparing results with an estimate",
        ],
        correct: 2,
    },
];

const MCQ_HARD: &[McqTemplate] = &[
    McqTemplate {
        prompt: "Which trade-off matters most when combining {topic} with earlier material?",
        options: [
            "There are never any trade-offs",
            "Formatting of the final answer",
            "The order the sections were read in",
            "Balancing the assumptions of both ideas against the goal",
        ],
        correct: 3,
    },
    McqTemplate {
        prompt: "When would {topic} fail to give a correct result?",
        options: [
            "When its underlying assumptions do not hold",
            "Never, it is always correct",
            "Only on weekends",
            "When the reader is tired",
        ],
        correct: 0,
    },
    McqTemplate {
        prompt: "How does {topic} relate to the broader subject?",
        options: [
            "It is completely isolated",
            "It replaces the broader subject",
            "It is one building block that connects to other concepts",
            "It is an optional footnote",
        ],
        correct: 2,
    },
];

const SHORT_EASY: &[ShortAnswerTemplate] = &[
    ShortAnswerTemplate {
        prompt: "In one sentence, define {topic}.",
        acceptable: &["the core concept explained in the reading"],
    },
    ShortAnswerTemplate {
        prompt: "Name the key term introduced in {topic}.",
        acceptable: &["the key term defined in the reading"],
    },
];

const SHORT_MEDIUM: &[ShortAnswerTemplate] = &[
    ShortAnswerTemplate {
        prompt: "Describe a situation where you would use {topic}.",
        acceptable: &[
            "apply the concept to solve a practical problem",
            "use the concept when the problem matches its assumptions",
        ],
    },
    ShortAnswerTemplate {
        prompt: "What steps do you follow when applying {topic}?",
        acceptable: &["identify the concept check the assumptions then follow the steps"],
    },
];

const SHORT_HARD: &[ShortAnswerTemplate] = &[
    ShortAnswerTemplate {
        prompt: "Explain how {topic} connects to what you learned earlier.",
        acceptable: &["it builds on earlier concepts and connects them to new problems"],
    },
    ShortAnswerTemplate {
        prompt: "Describe a limitation of {topic} and how to work around it.",
        acceptable: &[
            "its assumptions may not hold so check them and adapt the approach",
            "verify the assumptions before relying on the result",
        ],
    },
    ShortAnswerTemplate {
        prompt: "Combine {topic} with another idea to solve a harder problem.",
        acceptable: &["combine both concepts while balancing their assumptions against the goal"],
    },
];

pub(crate) fn mcq_templates(difficulty: Difficulty) -> &'static [McqTemplate] {
    match difficulty {
        Difficulty::Easy => MCQ_EASY,
        Difficulty::Medium => MCQ_MEDIUM,
        Difficulty::Hard => MCQ_HARD,
    }
}

pub(crate) fn short_answer_templates(difficulty: Difficulty) -> &'static [ShortAnswerTemplate] {
    match difficulty {
        Difficulty::Easy => SHORT_EASY,
        Difficulty::Medium => SHORT_MEDIUM,
        Difficulty::Hard => SHORT_HARD,
    }
}

pub(crate) fn fill(template: &str, topic: &str) -> String {
    template.replace(TOPIC_PLACEHOLDER, topic)
}

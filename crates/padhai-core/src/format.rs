use crate::types::{Chapter, GeneratedQuestion, QuizItem, Reference, SummaryMode, SummaryResult};

/// Format a finished summary as human-readable markdown
pub fn format_summary_readable(result: &SummaryResult, mode: SummaryMode, language: &str) -> String {
    let mut output = String::new();

    let heading = match mode {
        SummaryMode::Video => "Video Summary",
        SummaryMode::Podcast => "Podcast-Style Summary",
    };
    output.push_str(&format!("# {heading}\n\n"));

    output.push_str(&format!("**Language:** {language}"));
    if let Some(source) = result.source {
        output.push_str(&format!(" | **Source:** {}", source.label()));
    }
    output.push_str("\n\n");

    if let Some(warning) = &result.warning {
        output.push_str(&format!("> Warning: {warning}\n\n"));
    }

    if result.is_empty() {
        output.push_str("No summary content available.\n");
    } else {
        output.push_str(&result.summary);
        if !result.summary.ends_with('\n') {
            output.push('\n');
        }
    }

    output
}

/// Format a chapter as human-readable markdown
pub fn format_chapter_readable(chapter: &Chapter) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", chapter.title));

    let mut meta = Vec::new();
    if let Some(class) = &chapter.class_details {
        meta.push(format!("**Class:** {}", class.title));
    }
    if let Some(subject) = &chapter.subject_details {
        meta.push(format!("**Subject:** {}", subject.title));
    }
    if let Some(created) = &chapter.created_at {
        meta.push(format!("**Created:** {}", format_date(created)));
    }
    if !meta.is_empty() {
        output.push_str(&meta.join(" | "));
        output.push_str("\n\n");
    }

    if let Some(description) = &chapter.description {
        if !description.trim().is_empty() {
            output.push_str(&format!("_{}_\n\n", description.trim()));
        }
    }

    output.push_str(&chapter.content);
    if !chapter.content.ends_with('\n') {
        output.push('\n');
    }

    if !chapter.yt_links.is_empty() {
        output.push_str("\n## Videos\n\n");
        for link in &chapter.yt_links {
            if link.title.is_empty() {
                output.push_str(&format!("• {}\n", link.url));
            } else {
                output.push_str(&format!("• {} — {}\n", link.title, link.url));
            }
        }
    }

    output
}

/// Format generated study questions; unrevealed answers stay hidden.
pub fn format_questions_readable(questions: &[GeneratedQuestion]) -> String {
    let mut output = String::new();
    for (i, q) in questions.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, q.question));
        if q.revealed {
            output.push_str(&format!("   {}\n", q.answer));
        } else {
            output.push_str("   (answer hidden)\n");
        }
        output.push('\n');
    }
    output
}

/// Format suggested references as a bulleted list
pub fn format_references_readable(references: &[Reference]) -> String {
    let mut output = String::new();
    for reference in references {
        output.push_str(&format!("• {}\n", reference.title));
        output.push_str(&format!("  {}\n", reference.description));
        output.push_str(&format!("  {}\n\n", reference.url));
    }
    output
}

/// Format quiz results: each question with the learner's pick, the correct
/// option and the explanation.
pub fn format_quiz_results_readable(items: &[QuizItem]) -> String {
    let mut output = String::new();
    let score = items.iter().filter(|i| i.is_correct()).count();

    for (i, item) in items.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, item.question));
        for (j, option) in item.options.iter().enumerate() {
            let marker = if j == item.correct_answer {
                "✓"
            } else if item.selected == Some(j) {
                "✗"
            } else {
                " "
            };
            output.push_str(&format!("   {marker} {}. {option}\n", option_letter(j)));
        }
        output.push_str(&format!("   {}\n\n", item.explanation));
    }

    output.push_str(&format!("Score: {score}/{}\n", items.len()));
    output
}

pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Date portion of an ISO-8601 timestamp, as stored by the backend.
fn format_date(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurriculumRef, SummarySource, VideoLink};

    #[test]
    fn summary_includes_warning_banner_and_body() {
        let result = SummaryResult {
            summary: "# Notes\n\nBody.".to_string(),
            source: Some(SummarySource::Youtube),
            warning: Some("partial captions".to_string()),
        };
        let text = format_summary_readable(&result, SummaryMode::Video, "English");
        assert!(text.contains("# Video Summary"));
        assert!(text.contains("**Source:** YouTube subtitles"));
        assert!(text.contains("> Warning: partial captions"));
        assert!(text.contains("Body."));
    }

    #[test]
    fn empty_summary_renders_placeholder_not_blank() {
        let result = SummaryResult {
            summary: String::new(),
            source: None,
            warning: Some("The server returned an empty summary.".to_string()),
        };
        let text = format_summary_readable(&result, SummaryMode::Podcast, "Hindi");
        assert!(text.contains("No summary content available."));
        assert!(text.contains("> Warning:"));
    }

    #[test]
    fn chapter_renders_meta_and_links() {
        let chapter = Chapter {
            id: "0123456789abcdef01234567".to_string(),
            title: "Photosynthesis".to_string(),
            content: "Plants make food.".to_string(),
            description: Some("Intro chapter".to_string()),
            yt_links: vec![VideoLink {
                id: "a".to_string(),
                title: "Intro".to_string(),
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                description: String::new(),
            }],
            class_details: Some(CurriculumRef {
                id: "c".to_string(),
                title: "Class 10".to_string(),
            }),
            subject_details: None,
            created_at: Some("2025-03-01T10:00:00.000Z".to_string()),
        };
        let text = format_chapter_readable(&chapter);
        assert!(text.contains("# Photosynthesis"));
        assert!(text.contains("**Class:** Class 10"));
        assert!(text.contains("**Created:** 2025-03-01"));
        assert!(text.contains("• Intro — https://youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn hidden_answers_stay_hidden() {
        let questions = vec![GeneratedQuestion {
            question: "Q?".to_string(),
            answer: "Secret".to_string(),
            revealed: false,
        }];
        let text = format_questions_readable(&questions);
        assert!(text.contains("(answer hidden)"));
        assert!(!text.contains("Secret"));
    }

    #[test]
    fn quiz_results_mark_correct_and_wrong_picks() {
        let items = vec![QuizItem {
            question: "Pick B".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 1,
            explanation: "B is right.".to_string(),
            selected: Some(0),
        }];
        let text = format_quiz_results_readable(&items);
        assert!(text.contains("✗ A. a"));
        assert!(text.contains("✓ B. b"));
        assert!(text.contains("Score: 0/1"));
    }
}

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use padhai_core::{
    ApiClient, AVAILABLE_LANGUAGES, Chapter, HttpTextModel, Provider, Stage, SummaryClient,
    SummaryMode, SummaryRequest, VideoReference, ask_question, fallback_questions, fallback_quiz,
    fallback_references, format_chapter_readable, format_questions_readable,
    format_quiz_results_readable, format_references_readable, format_summary_readable,
    generate_questions, generate_quiz, generate_references, language_name,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Groq,
    Gpt4,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Groq => Provider::Groq,
            CliProvider::Gpt4 => Provider::Gpt4,
        }
    }
}

/// CLI wrapper for SummaryMode (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliMode {
    #[default]
    Video,
    Podcast,
}

impl From<CliMode> for SummaryMode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::Video => SummaryMode::Video,
            CliMode::Podcast => SummaryMode::Podcast,
        }
    }
}

#[derive(Parser)]
#[command(name = "padhai")]
#[command(about = "Turn YouTube videos into curriculum-aligned chapters with AI study aids")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a YouTube video; the backend saves the result as a chapter
    Summarize {
        /// Video URL (watch/share/embed/shorts link) or bare video ID
        url: String,

        /// Summary language code (see `padhai languages`)
        #[arg(short, long, default_value = "en")]
        lang: String,

        /// Presentation mode for the summary
        #[arg(short, long, value_enum, default_value_t = CliMode::Video)]
        mode: CliMode,

        /// AI model the backend should use
        #[arg(long, value_enum, default_value_t = CliProvider::Gemini)]
        model: CliProvider,

        /// Class ID to file the chapter under (see `padhai classes`)
        #[arg(long)]
        class: String,

        /// Subject ID to file the chapter under (see `padhai subjects`)
        #[arg(long)]
        subject: String,

        /// Optional chapter title
        #[arg(long)]
        title: Option<String>,

        /// Optional chapter description
        #[arg(long)]
        description: Option<String>,
    },

    /// List saved chapters
    Chapters,

    /// Show a chapter's content and video links
    Chapter { id: String },

    /// List classes in the curriculum hierarchy
    Classes,

    /// List subjects in the curriculum hierarchy
    Subjects,

    /// List supported summary languages
    Languages,

    /// Generate study questions for a chapter
    Questions {
        id: String,

        /// Print questions only; answers stay hidden
        #[arg(long)]
        hide_answers: bool,

        #[arg(long, value_enum, default_value_t = CliProvider::Gemini)]
        model: CliProvider,
    },

    /// Suggest references and further reading for a chapter
    References {
        id: String,

        #[arg(long, value_enum, default_value_t = CliProvider::Gemini)]
        model: CliProvider,
    },

    /// Take an interactive multiple-choice quiz on a chapter
    Quiz {
        id: String,

        #[arg(long, value_enum, default_value_t = CliProvider::Gemini)]
        model: CliProvider,
    },

    /// Ask a free-form question about a chapter
    Ask {
        id: String,
        question: String,

        #[arg(long, value_enum, default_value_t = CliProvider::Gemini)]
        model: CliProvider,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn banner() {
    println!(
        "\n{}  {}\n",
        style("padhai").cyan().bold(),
        style("Curriculum Video Summarizer").dim()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Summarize {
            url,
            lang,
            mode,
            model,
            class,
            subject,
            title,
            description,
        } => summarize(url, lang, mode.into(), model.into(), class, subject, title, description).await,
        Command::Chapters => list_chapters().await,
        Command::Chapter { id } => show_chapter(&id).await,
        Command::Classes => list_classes().await,
        Command::Subjects => list_subjects().await,
        Command::Languages => {
            for (name, code) in AVAILABLE_LANGUAGES {
                println!("{}  {}", style(format!("{code:>3}")).yellow(), name);
            }
            Ok(())
        }
        Command::Questions {
            id,
            hide_answers,
            model,
        } => questions(&id, hide_answers, model.into()).await,
        Command::References { id, model } => references(&id, model.into()).await,
        Command::Quiz { id, model } => quiz(&id, model.into()).await,
        Command::Ask {
            id,
            question,
            model,
        } => ask(&id, &question, model.into()).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn summarize(
    url: String,
    lang: String,
    mode: SummaryMode,
    model: Provider,
    class: String,
    subject: String,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    banner();

    let video = match VideoReference::from_video_url(&url) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let request = SummaryRequest {
        video,
        language: lang.clone(),
        mode,
        model,
        class_id: class,
        subject_id: subject,
        title,
        description,
    };

    let client = SummaryClient::new()?;

    // One spinner line per stage; finished stages collapse to a ✓ line,
    // mirroring the stage checklist learners see on the web.
    let mut current: Option<(Stage, ProgressBar)> = None;
    let result = client
        .summarize(&request, |update| {
            let message = if update.total_chunks > 0 {
                format!(
                    "{} ({}/{}) {}%",
                    update.stage.label(),
                    update.current_chunk,
                    update.total_chunks,
                    update.percent()
                )
            } else {
                update.stage.label().to_string()
            };
            match &mut current {
                Some((stage, pb)) if *stage == update.stage => pb.set_message(message),
                _ => {
                    if let Some((stage, pb)) = current.take() {
                        pb.finish_with_message(format!(
                            "{} {}",
                            style("✓").green().bold(),
                            stage.label()
                        ));
                    }
                    current = Some((update.stage, create_spinner(&message)));
                }
            }
        })
        .await;

    match result {
        Ok(summary) => {
            if let Some((stage, pb)) = current.take() {
                pb.finish_with_message(format!(
                    "{} {}",
                    style("✓").green().bold(),
                    stage.label()
                ));
            }

            if let Some(warning) = &summary.warning {
                println!(
                    "\n{} {}",
                    style("Warning:").yellow().bold(),
                    style(warning).yellow()
                );
            }

            println!("\n{}", style("─".repeat(60)).dim());
            println!(
                "{}",
                format_summary_readable(&summary, mode, language_name(&lang))
            );
            println!(
                "{}",
                style("View saved chapters with `padhai chapters`.").dim()
            );
            Ok(())
        }
        Err(e) => {
            if let Some((_, pb)) = current.take() {
                pb.abandon();
            }
            eprintln!("\n{} {}", style("Error:").red().bold(), e);
            eprintln!(
                "{}",
                style("Run the same command again to retry.").dim()
            );
            std::process::exit(1);
        }
    }
}

async fn list_chapters() -> Result<()> {
    banner();
    let api = ApiClient::new()?;
    let spinner = create_spinner("Loading chapters...");
    let chapters = api.list_chapters().await?;
    spinner.finish_and_clear();

    if chapters.is_empty() {
        println!("{}", style("No chapters yet.").dim());
        return Ok(());
    }

    for chapter in &chapters {
        print_chapter_line(chapter);
    }
    println!(
        "\n{}",
        style("Show one with `padhai chapter <id>`.").dim()
    );
    Ok(())
}

fn print_chapter_line(chapter: &Chapter) {
    let mut tags = Vec::new();
    if let Some(class) = &chapter.class_details {
        tags.push(class.title.clone());
    }
    if let Some(subject) = &chapter.subject_details {
        tags.push(subject.title.clone());
    }
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(" · "))
    };

    println!(
        "{} {}{}",
        style(&chapter.id).dim(),
        style(&chapter.title).bold(),
        style(tags).yellow()
    );
    let preview = truncate(&chapter.content, 100);
    if !preview.is_empty() {
        println!("  {}", style(preview).dim());
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}

async fn show_chapter(id: &str) -> Result<()> {
    let api = ApiClient::new()?;
    let spinner = create_spinner("Loading chapter...");
    let chapter = api.get_chapter(id).await?;
    spinner.finish_and_clear();

    println!("{}", format_chapter_readable(&chapter));
    println!(
        "{}",
        style(format!(
            "Study aids: `padhai questions {id}`, `padhai references {id}`, `padhai quiz {id}`, `padhai ask {id} \"...\"`."
        ))
        .dim()
    );
    Ok(())
}

async fn list_classes() -> Result<()> {
    let api = ApiClient::new()?;
    let spinner = create_spinner("Loading classes...");
    let classes = api.list_classes().await?;
    spinner.finish_and_clear();
    for class in &classes {
        println!("{} {}", style(&class.id).dim(), class.title);
    }
    Ok(())
}

async fn list_subjects() -> Result<()> {
    let api = ApiClient::new()?;
    let spinner = create_spinner("Loading subjects...");
    let subjects = api.list_subjects().await?;
    spinner.finish_and_clear();
    for subject in &subjects {
        println!("{} {}", style(&subject.id).dim(), subject.title);
    }
    Ok(())
}

/// Fetch a chapter and build the model client, validating the API key early.
async fn chapter_and_model(id: &str, provider: Provider) -> Result<(Chapter, HttpTextModel)> {
    let model = match HttpTextModel::new(provider) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    let api = ApiClient::new()?;
    let chapter = api.get_chapter(id).await?;
    Ok((chapter, model))
}

fn fallback_notice(what: &str, e: &padhai_core::PadhaiError) {
    println!(
        "{} {}",
        style("Warning:").yellow().bold(),
        style(format!(
            "couldn't generate {what} ({e}); showing a placeholder instead"
        ))
        .yellow()
    );
}

async fn questions(id: &str, hide_answers: bool, provider: Provider) -> Result<()> {
    let (chapter, model) = chapter_and_model(id, provider).await?;

    let spinner = create_spinner(&format!("Generating questions with {}...", provider.name()));
    let generated = generate_questions(&model, &chapter.content, chapter.description.as_deref()).await;
    spinner.finish_and_clear();

    let mut questions = match generated {
        Ok(questions) => questions,
        Err(e) => {
            fallback_notice("questions", &e);
            fallback_questions()
        }
    };
    if !hide_answers {
        for q in &mut questions {
            q.revealed = true;
        }
    }

    println!("\n{}\n", style(format!("Questions — {}", chapter.title)).bold());
    print!("{}", format_questions_readable(&questions));
    if hide_answers {
        println!(
            "{}",
            style("Re-run without --hide-answers to reveal the answers.").dim()
        );
    }
    Ok(())
}

async fn references(id: &str, provider: Provider) -> Result<()> {
    let (chapter, model) = chapter_and_model(id, provider).await?;

    let spinner = create_spinner(&format!("Generating references with {}...", provider.name()));
    let generated =
        generate_references(&model, &chapter.content, chapter.description.as_deref()).await;
    spinner.finish_and_clear();

    let references = match generated {
        Ok(references) => references,
        Err(e) => {
            fallback_notice("references", &e);
            fallback_references()
        }
    };

    println!("\n{}\n", style(format!("References — {}", chapter.title)).bold());
    print!("{}", format_references_readable(&references));
    Ok(())
}

async fn quiz(id: &str, provider: Provider) -> Result<()> {
    let (chapter, model) = chapter_and_model(id, provider).await?;

    let spinner = create_spinner(&format!("Generating quiz with {}...", provider.name()));
    let generated = generate_quiz(&model, &chapter.content, chapter.description.as_deref()).await;
    spinner.finish_and_clear();

    let mut items = match generated {
        Ok(items) => items,
        Err(e) => {
            fallback_notice("the quiz", &e);
            fallback_quiz()
        }
    };

    println!("\n{}\n", style(format!("Quiz — {}", chapter.title)).bold());
    let term = Term::stdout();
    for (i, item) in items.iter_mut().enumerate() {
        println!("{}. {}", i + 1, style(&item.question).bold());
        for (j, option) in item.options.iter().enumerate() {
            println!("   {}. {option}", padhai_core::format::option_letter(j));
        }
        item.selected = prompt_choice(&term, item.options.len())?;
        println!();
    }

    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_quiz_results_readable(&items));
    Ok(())
}

/// Read a letter choice; empty input skips the question.
fn prompt_choice(term: &Term, option_count: usize) -> Result<Option<usize>> {
    loop {
        term.write_str(&format!(
            "   Your answer [A-{}], or Enter to skip: ",
            padhai_core::format::option_letter(option_count - 1)
        ))?;
        let line = term.read_line()?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if let Some(c) = trimmed.chars().next() {
            let index = (c.to_ascii_uppercase() as i32) - ('A' as i32);
            if trimmed.chars().count() == 1 && (0..option_count as i32).contains(&index) {
                return Ok(Some(index as usize));
            }
        }
        println!("   {}", style("Please answer with a single letter.").dim());
    }
}

async fn ask(id: &str, question: &str, provider: Provider) -> Result<()> {
    let (chapter, model) = chapter_and_model(id, provider).await?;

    let spinner = create_spinner(&format!("Asking {}...", provider.name()));
    let answer = ask_question(
        &model,
        &chapter.content,
        question,
        chapter.description.as_deref(),
    )
    .await;
    spinner.finish_and_clear();

    match answer {
        Ok(answer) => {
            println!("\n{}\n", style(question).bold());
            println!("{answer}");
        }
        Err(e) => {
            fallback_notice("an answer", &e);
            println!(
                "Sorry, I encountered an error while processing your question. Please try again."
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_flattens_whitespace_and_bounds_length() {
        assert_eq!(truncate("one\ntwo   three", 100), "one two three");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}

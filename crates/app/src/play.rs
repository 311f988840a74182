//! Interactive terminal loop.

use log::debug;
use quiz_core::model::{AnswerFeedback, Selection, ShuffledQuestion};
use quiz_core::scoring::QuizSummary;
use services::{QuizService, QuizSession, SubmitOutcome, TimerEvent};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

type Input = Lines<BufReader<Stdin>>;

enum Step {
    Answered(SubmitOutcome),
    Quit,
}

pub async fn run(service: &QuizService) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = BufReader::new(stdin()).lines();
    let (tx, mut rx) = unbounded_channel();
    let mut session = QuizSession::new();

    if let Some(best) = service.best_score().await? {
        println!("Best so far: {}% ({}/{})", best.percentage, best.score, best.total);
    }

    service.start(&mut session)?;
    loop {
        print_question(service, &session);
        let mut timer = service.start_timer(&session, tx.clone());
        let step = ask(service, &mut session, &mut input, &mut rx).await?;
        timer.cancel();

        let outcome = match step {
            Step::Answered(outcome) => outcome,
            Step::Quit => return Ok(()),
        };
        print_feedback(&outcome.feedback);

        if let Some(summary) = &outcome.summary {
            print_summary(summary, outcome.new_best);
            if let Some(best) = service.best_score().await? {
                println!("Best: {}% ({}/{})", best.percentage, best.score, best.total);
            }
            if !confirm(&mut input, "Play again? [y/N] ").await? {
                return Ok(());
            }
            service.restart(&mut session)?;
            continue;
        }

        println!("Press Enter for the next question (q to quit).");
        match input.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("q") => return Ok(()),
            None => return Ok(()),
            Some(_) => {}
        }
        service.advance(&mut session)?;
    }
}

/// Wait for either a valid answer line or the timer running out.
async fn ask(
    service: &QuizService,
    session: &mut QuizSession,
    input: &mut Input,
    events: &mut UnboundedReceiver<TimerEvent>,
) -> Result<Step, Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(Step::Quit);
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    return Ok(Step::Quit);
                }
                let len = session.current_question().map_or(0, |q| q.alternatives().len());
                match parse_choice(line, len) {
                    Some(selection) => {
                        let outcome = service.submit(session, selection).await?;
                        return Ok(Step::Answered(outcome));
                    }
                    None => println!("Type a number from 1 to {len}, or q to quit."),
                }
            }
            Some(event) = events.recv() => match event {
                TimerEvent::Tick { session_id, position, remaining, urgent } => {
                    if session.session_id() == Some(session_id)
                        && session.awaits_answer(position)
                        && (urgent || remaining % 10 == 0)
                    {
                        println!("  {remaining}s left");
                    }
                }
                TimerEvent::Expired { session_id, position } => {
                    if let Some(outcome) = service.expire(session, session_id, position).await? {
                        println!("Time's up!");
                        return Ok(Step::Answered(outcome));
                    }
                    debug!("dropped stale expiry for position {position}");
                }
            },
        }
    }
}

/// 1-based choice typed by the user, as a shuffled alternative index.
fn parse_choice(line: &str, len: usize) -> Option<Selection> {
    let n: usize = line.parse().ok()?;
    (1..=len).contains(&n).then(|| Selection::Alternative(n - 1))
}

async fn confirm(input: &mut Input, prompt: &str) -> std::io::Result<bool> {
    println!("{prompt}");
    Ok(input
        .next_line()
        .await?
        .is_some_and(|line| matches!(line.trim(), "y" | "Y" | "yes")))
}

fn print_question(service: &QuizService, session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{} [{}]",
        progress.current,
        progress.total,
        question.topic()
    );
    print_alternatives(question);
    if service.settings().timer_enabled() {
        println!("You have {}s.", service.settings().seconds_per_question());
    }
}

fn print_alternatives(question: &ShuffledQuestion) {
    println!("{}", question.prompt());
    for (i, alternative) in question.alternatives().iter().enumerate() {
        println!("  {}) {alternative}", i + 1);
    }
}

fn print_feedback(feedback: &AnswerFeedback) {
    if feedback.is_correct {
        println!("Correct!");
    } else if feedback.selection.is_no_answer() {
        println!(
            "No answer. The right one was {}) {}",
            feedback.correct_index + 1,
            feedback.correct_alternative
        );
    } else {
        println!(
            "Not quite. The right one was {}) {}",
            feedback.correct_index + 1,
            feedback.correct_alternative
        );
        if let Some(why) = &feedback.wrong_explanation {
            println!("  {why}");
        }
    }
    println!("{}", feedback.explanation);
}

fn print_summary(summary: &QuizSummary, new_best: bool) {
    println!();
    println!(
        "You scored {}/{} ({}%)",
        summary.score, summary.total, summary.percentage
    );
    println!("{}", summary.tier.message());
    if new_best {
        println!("New best score!");
    }
    if summary.qualifies_for_certificate {
        println!("Certificate earned.");
    }
    if summary.unanswered > 0 {
        println!("{} question(s) left unanswered.", summary.unanswered);
    }
    println!("Total time: {}s", summary.total_time_secs);

    println!("By topic:");
    for (topic, tally) in summary.theme_stats.iter() {
        println!(
            "  {topic}: {}/{} ({}%)",
            tally.correct,
            tally.total,
            tally.percentage()
        );
    }
    if !summary.difficult_topics.is_empty() {
        let names: Vec<String> = summary
            .difficult_topics
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Worth reviewing: {}", names.join(", "));
    }
}

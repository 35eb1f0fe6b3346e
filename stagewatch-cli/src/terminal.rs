use colored::{ColoredString, Colorize};
use stagewatch::view::BadgeView;
use stagewatch::{ProcessState, StatusSnapshot};
use std::sync::Mutex;

/// Prints one line per badge change.
#[derive(Default)]
pub struct TerminalBadge {
    state: Mutex<String>,
    last_line: Mutex<Option<String>>,
}

impl BadgeView for TerminalBadge {
    fn set_class(&self, class: &str) {
        // The state is the last class token.
        let state = class.rsplit(' ').next().unwrap_or_default();
        *self.state.lock().unwrap() = state.to_string();
    }

    fn set_tooltip(&self, text: &str) {
        let mut last = self.last_line.lock().unwrap();
        if last.as_deref() == Some(text) {
            return;
        }
        let state = self.state.lock().unwrap().clone();
        println!(
            "{} {}",
            chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
            paint(&state, text.to_string())
        );
        *last = Some(text.to_string());
    }
}

pub fn paint(state: &str, text: String) -> ColoredString {
    match state {
        "synchron" => text.green(),
        "running" => text.yellow(),
        "error" | "faulty" => text.red().bold(),
        "aborted" => text.magenta(),
        "norelease" | "switchedoff" => text.dimmed(),
        _ => text.normal(),
    }
}

pub fn print_status(release_path: &str, snapshot: &StatusSnapshot) {
    let summary = &snapshot.summary;
    println!(
        "{}:{}  {}  {:>3}%",
        summary.stage,
        release_path.bold(),
        paint(summary.state.as_str(), summary.state.to_string()),
        summary.progress
    );
    if let Some(finished) = &summary.finished_at {
        println!("  finished at {}", finished);
    }
    for process in &snapshot.processes {
        print_process(process);
    }
}

fn print_process(process: &ProcessState) {
    let mut line = format!(
        "  {:<24} {} {:>3}%",
        process.display_title(),
        paint(process.state.as_str(), format!("{:<12}", process.state.as_str())),
        process.progress
    );
    if let Some(finished) = &process.finished_at {
        line.push_str(&format!("  finished at {}", finished));
    }
    if !process.enabled {
        line.push_str(&format!("  {}", "disabled".dimmed()));
    }
    println!("{}", line);
}

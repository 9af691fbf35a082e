use colored::Colorize;
use reconcile::{BatchResult, Outcome, Resource};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.green().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Per-item Results
// ============================================================================

/// One line per item: a green check or a red cross with the reason.
pub fn batch_lines<T: Resource>(result: &BatchResult<T>) -> Vec<String> {
    result
        .results
        .iter()
        .map(|r| match &r.outcome {
            Outcome::Succeeded => format!("{} {}", "✓".green(), r.item.id()),
            Outcome::Failed { kind, message } => format!(
                "{} {} {}",
                "✗".red(),
                r.item.id(),
                format!("[{kind}] {message}").red()
            ),
        })
        .collect()
}

/// Print the per-item results of one batch
pub fn print_batch<T: Resource>(result: &BatchResult<T>) {
    if result.is_empty() {
        dim("(nothing to do)");
        return;
    }
    for line in batch_lines(result) {
        println!("  {line}");
    }
}

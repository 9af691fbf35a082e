//! Apply flow with terminal output.
//!
//! Lists the broker state, prints the add-set, the delete-set and the diff,
//! then runs the plan through [`reconcile::execute`].

use anyhow::{Result, bail};
use colored::Colorize;
use kafkakit::Tabular;
use kafkakit::rows::to_table;
use reconcile::{
    BatchResult, Collection, ExecuteOptions, ExecuteSummary, Phase, ProgressCallback, Resource,
    Store, execute, plan_against,
};

use super::differ::display_diff;
use crate::progress;
use crate::ui;

/// Prints each phase's results as it completes.
#[derive(Default)]
pub struct UiProgress {
    spinner: Option<indicatif::ProgressBar>,
}

impl<T: Resource> ProgressCallback<T> for UiProgress {
    fn on_phase_start(&mut self, phase: Phase, count: usize) {
        ui::section(&format!("Result of {phase}"));
        if count > 0 {
            self.spinner = Some(progress::spinner(&format!(
                "Requesting {count} {} {phase}(s)...",
                T::KIND
            )));
        }
    }

    fn on_phase_complete(&mut self, _phase: Phase, result: &BatchResult<T>) {
        if let Some(pb) = self.spinner.take() {
            progress::finish_clear(&pb);
        }
        ui::print_batch(result);
    }
}

/// Reconcile one resource kind against its desired state.
///
/// Fails after printing everything when any item could not be applied.
pub fn apply<T, S>(store: &S, desired: &Collection<T>, opts: ExecuteOptions) -> Result<()>
where
    T: Resource + Tabular,
    S: Store<T, Error = kafkakit::Error>,
{
    let pb = progress::spinner(&format!("Listing {}s...", T::KIND));
    let plan = match plan_against(store, desired) {
        Ok(plan) => {
            progress::finish_clear(&pb);
            plan
        }
        Err(e) => {
            progress::finish_error(&pb, &format!("Could not list {}s", T::KIND));
            return Err(e.into());
        }
    };

    ui::section("Will be added");
    println!("{}", to_table(&plan.to_add));
    ui::section("Will be deleted");
    println!("{}", to_table(&plan.to_delete));

    ui::section("diff");
    display_diff(&to_table(&plan.aligned_current), &to_table(desired));

    let report = execute(store, &plan, opts, &mut UiProgress::default())?;

    if !report.applied {
        println!();
        println!("{}", "Check mode".blue());
        ui::dim(&format!(
            "{} to add, {} to delete",
            plan.to_add.len(),
            plan.to_delete.len()
        ));
    } else {
        print_summary(&report.summary());
        if report.is_interrupted() {
            println!();
            ui::error("The broker stopped answering partway; interrupted items were not confirmed");
        }
    }

    println!();
    println!("{}", "Finish".green());

    if !report.is_success() {
        bail!(
            "{} {} change(s) failed",
            report.summary().failed,
            T::KIND
        );
    }
    Ok(())
}

fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Definitions applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Definitions applied with errors", "⚠".yellow().bold());
    }

    if summary.added > 0 {
        println!("    • {} added", summary.added);
    }
    if summary.deleted > 0 {
        println!("    • {} deleted", summary.deleted);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}

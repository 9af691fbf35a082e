// Resource commands
pub mod acl;
pub mod topic;

// Read-only inspection
pub mod consumer_group_offsets;
pub mod consumer_groups;

use anyhow::{Result, bail};
use reconcile::{BatchResult, Resource};

use crate::ui;

/// Report a single-item add or remove, failing when the item failed.
fn report_single<T: Resource>(result: &BatchResult<T>, done: &str) -> Result<()> {
    ui::print_batch(result);

    if let Some(failed) = result.failed().next() {
        bail!("{} {} was not changed", T::KIND, failed.item.id());
    }

    println!();
    ui::success(done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::DEFAULT_DEFINITIONS;
    use kafkakit::Definitions;
    use std::path::Path;

    #[test]
    fn test_shipped_definitions_load() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DEFINITIONS);
        let definitions = Definitions::load(&path).unwrap();

        assert_eq!(definitions.schema_version(), 1);
        assert!(!definitions.topics().is_empty());
        assert!(!definitions.acls().is_empty());
    }
}

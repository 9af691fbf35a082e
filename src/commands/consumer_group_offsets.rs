//! Committed consumer group offsets.

use anyhow::Result;
use kafkakit::GroupOffset;
use kafkakit::table;

use crate::Context as AppContext;
use crate::cli::ConsumerGroupOffsetsCommand;
use crate::{progress, ui};

const COLUMNS: &[&str] = &["group", "topic", "partition", "offset", "log_end_offset", "lag"];

pub fn run(ctx: &AppContext, cmd: ConsumerGroupOffsetsCommand) -> Result<()> {
    match cmd {
        ConsumerGroupOffsetsCommand::List => list(ctx),
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let client = ctx.client()?;

    let pb = progress::spinner("Fetching committed offsets...");
    let offsets = client.consumer_group_offsets().list();
    progress::finish_clear(&pb);
    let offsets = offsets?;

    if offsets.is_empty() {
        ui::info("No committed offsets");
        return Ok(());
    }

    print!("{}", render(&offsets));
    Ok(())
}

fn render(offsets: &[GroupOffset]) -> String {
    let optional = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();

    let rows: Vec<Vec<String>> = offsets
        .iter()
        .map(|o| {
            vec![
                o.group.clone(),
                o.topic.clone(),
                o.partition.to_string(),
                o.offset.to_string(),
                optional(o.log_end_offset),
                optional(o.lag),
            ]
        })
        .collect();

    table::render(COLUMNS, &rows)
}

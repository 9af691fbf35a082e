//! Consumer group inspection.

use anyhow::Result;
use colored::Colorize;
use kafkakit::ConsumerGroup;

use crate::Context as AppContext;
use crate::cli::ConsumerGroupsCommand;
use crate::{progress, ui};

pub fn run(ctx: &AppContext, cmd: ConsumerGroupsCommand) -> Result<()> {
    match cmd {
        ConsumerGroupsCommand::List { detail } => list(ctx, detail),
    }
}

fn list(ctx: &AppContext, detail: bool) -> Result<()> {
    let client = ctx.client()?;
    let store = client.consumer_groups();

    let pb = progress::spinner("Listing consumer groups...");
    let groups = if detail {
        store.describe_all()
    } else {
        store.list()
    };
    progress::finish_clear(&pb);
    let groups = groups?;

    if groups.is_empty() {
        ui::info("No consumer groups");
        return Ok(());
    }

    for group in &groups {
        if detail {
            print_detail(group);
        } else {
            println!("{}", group.group_id);
        }
    }
    Ok(())
}

fn print_detail(group: &ConsumerGroup) {
    let unknown = || "-".to_string();

    ui::section(&group.group_id);
    ui::kv("state", &group.state.clone().unwrap_or_else(unknown));
    ui::kv("protocol", &group.protocol.clone().unwrap_or_else(unknown));
    ui::kv("coordinator", &group.coordinator.clone().unwrap_or_else(unknown));
    ui::kv("members", &group.members.len().to_string());

    for member in &group.members {
        println!(
            "    {} {} {}",
            member.member_id.bold(),
            member.client_id.dimmed(),
            member.host.dimmed()
        );
        for assignment in &member.assignment {
            let partitions: Vec<String> =
                assignment.partitions.iter().map(ToString::to_string).collect();
            println!("      {} [{}]", assignment.topic, partitions.join(", "));
        }
    }
}

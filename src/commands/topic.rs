//! Topic commands.

use anyhow::{Context, Result};
use kafkakit::rows::{render_topic_detail, to_json};
use kafkakit::{Definitions, Topic};
use reconcile::{ApplyOrder, ExecuteOptions, Store};

use super::report_single;
use crate::Context as AppContext;
use crate::cli::{ApplyArgs, TopicCommand};
use crate::{engine, progress, ui};

pub fn run(ctx: &AppContext, cmd: TopicCommand) -> Result<()> {
    match cmd {
        TopicCommand::Add {
            name,
            num_partitions,
            replication_factor,
        } => add(ctx, Topic::new(name, num_partitions, replication_factor)),
        TopicCommand::Remove { name } => remove(ctx, &name),
        TopicCommand::List { json } => list(ctx, json),
        TopicCommand::Apply(args) => apply(ctx, &args),
    }
}

fn add(ctx: &AppContext, topic: Topic) -> Result<()> {
    if !ctx.quiet {
        ui::kv("topic name", &topic.name);
        ui::kv("num of partitions", &topic.num_partitions.to_string());
        ui::kv("replication factor", &topic.replication_factor.to_string());
        println!();
    }

    let client = ctx.client()?;
    let result = client.topics().add(std::slice::from_ref(&topic))?;
    report_single(&result, "Topic added")
}

fn remove(ctx: &AppContext, name: &str) -> Result<()> {
    let client = ctx.client()?;
    // Deletion goes by name; the counts are not looked at
    let result = client.topics().delete(&[Topic::new(name, 1, 1)])?;
    report_single(&result, "Topic deleted")
}

fn list(ctx: &AppContext, json: bool) -> Result<()> {
    let client = ctx.client()?;

    let pb = progress::spinner("Describing topics...");
    let topics = client.topics().list();
    progress::finish_clear(&pb);
    let topics = topics?;

    if json {
        println!("{}", to_json(&topics)?);
    } else {
        print!("{}", render_topic_detail(&topics));
    }
    Ok(())
}

fn apply(ctx: &AppContext, args: &ApplyArgs) -> Result<()> {
    let definitions = Definitions::load(&args.definitions)
        .with_context(|| format!("Failed to load {}", args.definitions.display()))?;

    let client = ctx.client()?;
    let opts = ExecuteOptions {
        check: args.check,
        order: ApplyOrder::from_delete_first(args.delete_first),
    };
    engine::apply(&client.topics(), definitions.topics(), opts)
}

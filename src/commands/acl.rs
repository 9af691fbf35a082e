//! ACL commands.

use anyhow::{Context, Result};
use kafkakit::rows::{to_json, to_table};
use kafkakit::{AclFilter, Definitions};
use reconcile::{ApplyOrder, ExecuteOptions, Store};

use super::report_single;
use crate::Context as AppContext;
use crate::cli::{AclCommand, ApplyArgs};
use crate::{engine, progress};

pub fn run(ctx: &AppContext, cmd: AclCommand) -> Result<()> {
    match cmd {
        AclCommand::Add(args) => {
            let entry = args.into_entry();
            let client = ctx.client()?;
            let result = client.acls().add(std::slice::from_ref(&entry))?;
            report_single(&result, "ACL added")
        }
        AclCommand::Remove(args) => {
            let entry = args.into_entry();
            let client = ctx.client()?;
            let result = client.acls().delete(std::slice::from_ref(&entry))?;
            report_single(&result, "ACL deleted")
        }
        AclCommand::List {
            principal,
            resource_name,
            json,
        } => {
            let filter = AclFilter {
                principal,
                resource_name,
                ..AclFilter::any()
            };
            list(ctx, &filter, json)
        }
        AclCommand::Apply(args) => apply(ctx, &args),
    }
}

fn list(ctx: &AppContext, filter: &AclFilter, json: bool) -> Result<()> {
    let client = ctx.client()?;

    let pb = progress::spinner("Listing ACLs...");
    let acls = client.acls().list_filtered(filter);
    progress::finish_clear(&pb);
    let acls = acls?;

    if json {
        println!("{}", to_json(&acls)?);
    } else {
        print!("{}", to_table(&acls));
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
    engine::apply(&client.acls(), definitions.acls(), opts)
}

//! tapctl add / del implementation.

use anyhow::Context;
use clap::Args;
use tapdev::TapDevice;
use tracing::info;

use super::Output;

#[derive(Args)]
pub struct AddArgs {
    /// Interface name (kernel assigns tapN if omitted).
    pub name: Option<String>,

    /// Owner UID.
    #[arg(long)]
    pub owner: Option<u32>,

    /// Owner GID.
    #[arg(long)]
    pub group: Option<u32>,

    /// Set MTU.
    #[arg(long)]
    pub mtu: Option<u32>,

    /// Bring the interface up.
    #[arg(long)]
    pub up: bool,
}

#[derive(Args)]
pub struct DelArgs {
    /// Interface name.
    pub name: String,
}

pub fn run_add(args: AddArgs, output: &Output) -> anyhow::Result<()> {
    let mut builder = TapDevice::builder();
    if let Some(name) = &args.name {
        builder = builder.name(name);
    }
    if let Some(uid) = args.owner {
        builder = builder.owner(uid);
    }
    if let Some(gid) = args.group {
        builder = builder.group(gid);
    }

    let mut tap = builder.open().context("failed to create tap device")?;

    if let Some(mtu) = args.mtu {
        tap.set_mtu(mtu)
            .with_context(|| format!("failed to set MTU on {}", tap.name()))?;
    }
    if args.up {
        tap.set_up()
            .with_context(|| format!("failed to bring {} up", tap.name()))?;
    }

    // Persist last: until then a failure drops the device with the descriptor.
    tap.persist()
        .with_context(|| format!("failed to make {} persistent", tap.name()))?;

    let name = tap.name().to_string();
    tap.close()?;
    info!(%name, "created persistent tap device");

    if output.json {
        output.print_json(&serde_json::json!({ "name": name }))?;
    } else {
        println!("{}", name);
    }
    Ok(())
}

pub fn run_del(args: DelArgs) -> anyhow::Result<()> {
    if !tapdev::ifname::exists(&args.name) {
        anyhow::bail!("device {} does not exist", args.name);
    }
    TapDevice::delete_by_name(&args.name)
        .with_context(|| format!("failed to delete {}", args.name))?;
    info!(name = %args.name, "deleted tap device");
    Ok(())
}

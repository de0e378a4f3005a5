//! tapctl show implementation.

use clap::Args;
use tapdev::{Mode, TapInfo};

use super::Output;

#[derive(Args)]
pub struct ShowArgs {
    /// Only show this device.
    pub name: Option<String>,

    /// Only show TAP devices.
    #[arg(long)]
    pub tap_only: bool,
}

pub fn run(args: ShowArgs, output: &Output) -> anyhow::Result<()> {
    let devices: Vec<TapInfo> = tapdev::list_devices()?
        .into_iter()
        .filter(|d| args.name.as_deref().is_none_or(|n| d.name == n))
        .filter(|d| !args.tap_only || d.mode == Mode::Tap)
        .collect();

    if output.json {
        output.print_json(&serde_json::to_value(&devices)?)?;
        return Ok(());
    }

    for device in &devices {
        println!("{}", format_device(device));
    }
    Ok(())
}

fn format_device(info: &TapInfo) -> String {
    let mut line = format!("{}: {}", info.name, info.mode.name());
    if info.no_pi() {
        line.push_str(" no_pi");
    }
    if info.one_queue() {
        line.push_str(" one_queue");
    }
    if let Some(uid) = info.owner {
        line.push_str(&format!(" user {}", uid));
    }
    if let Some(gid) = info.group {
        line.push_str(&format!(" group {}", gid));
    }
    line
}

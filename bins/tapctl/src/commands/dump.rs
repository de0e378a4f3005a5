//! tapctl dump implementation.

use anyhow::Context;
use clap::Args;
use tapdev::TapDevice;
use tracing::debug;

#[derive(Args)]
pub struct DumpArgs {
    /// Interface name (kernel assigns tapN if omitted).
    pub name: Option<String>,

    /// Stop after this many frames.
    #[arg(short = 'c', long)]
    pub count: Option<u64>,

    /// Set MTU before reading.
    #[arg(long)]
    pub mtu: Option<u32>,
}

/// Ethernet header plus the largest MTU we expect.
const READ_SIZE: usize = 65535 + 14;

pub fn run(args: DumpArgs) -> anyhow::Result<()> {
    let tap = TapDevice::open(args.name.as_deref(), true).context("failed to open tap device")?;

    if let Some(mtu) = args.mtu {
        tap.set_mtu(mtu)?;
    }
    tap.set_up()
        .with_context(|| format!("failed to bring {} up", tap.name()))?;
    eprintln!("listening on {}", tap.name());

    let mut seen = 0u64;
    while args.count.is_none_or(|c| seen < c) {
        let frame = tap.read(READ_SIZE)?;
        if frame.is_empty() {
            debug!(name = %tap.name(), "end of stream");
            break;
        }
        seen += 1;
        println!("{} bytes", frame.len());
        print!("{}", hexdump(&frame));
    }
    Ok(())
}

/// Format bytes as 16 per line with an offset column.
fn hexdump(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        out.push_str(&format!("  {:04x}  {}\n", i * 16, hex.join(" ")));
    }
    out
}

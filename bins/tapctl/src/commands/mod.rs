//! tapctl command implementations.

pub mod add;
pub mod dump;
pub mod show;

/// Output options shared by all commands.
pub struct Output {
    pub json: bool,
    pub pretty: bool,
}

impl Output {
    /// Print a JSON value honoring `--pretty`.
    pub fn print_json(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", text);
        Ok(())
    }
}

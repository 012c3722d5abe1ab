use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "walrus-notes", about = "Walrus Notes static server and client tools")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}

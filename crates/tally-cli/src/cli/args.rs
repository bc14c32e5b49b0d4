use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Track expenses from the terminal: grouped list, running total, optimistic add"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// API base URL
    #[arg(long, global = true, env = "TALLY_API_URL")]
    pub url: Option<String>,

    /// Session token sent as a bearer credential
    #[arg(long, global = true, env = "TALLY_SESSION_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the artificial pauses before create and delete requests
    #[arg(long, global = true)]
    pub no_delay: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show all expenses grouped by category
    List,
    /// Show the total amount spent
    Total,
    /// Add an expense (shown immediately, committed when the server answers)
    Add(AddArgs),
    /// Delete an expense once the server confirms
    Delete(DeleteArgs),
    /// Show the signed-in user
    Whoami,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    /// Decimal amount with at most two fraction digits (e.g. 12.50)
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,

    /// YYYY-MM-DD or RFC 3339 timestamp [default: today]
    #[arg(long)]
    pub date: Option<String>,

    /// Category label; omit for "Unspecified"
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Id of the expense to delete
    pub id: i64,
}

use clap::Parser;

use recruit_crm::cli::{dispatch, Cli};
use recruit_crm::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dispatch(Cli::parse()).await
}

use anyhow::Result;

fn main() -> Result<()> {
    snapsweep_cli::run_cli()
}

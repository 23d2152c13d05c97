// crates.io
use clap::Parser;
// self
use sift_rank::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	sift_rank::run(args).await
}

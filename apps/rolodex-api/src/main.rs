use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = rolodex_api::Args::parse();
	rolodex_api::run(args).await
}

#![deny(rust_2018_idioms)]

#[tokio::main]
async fn main() -> miette::Result<()> {
	golr_cli::run().await
}

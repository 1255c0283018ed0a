use aerogear_pipes::cli::{Args, Runner};
use clap::Parser;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let runner = Runner::new(args);

    if let Err(e) = runner.run().await {
        runner.logger().error(&e.to_string());
        std::process::exit(1);
    }
}

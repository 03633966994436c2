mod cmd;

use std::process;

use clap::Parser;

use crate::cmd::{App, RunCommand};

#[tokio::main]
async fn main() {
    let app = App::parse();
    if let Err(e) = app.run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

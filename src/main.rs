#![forbid(unsafe_code)]

use clap::Parser;

fn main() {
    let config = hexlife_view::Config::parse();
    if let Err(err) = pollster::block_on(hexlife_view::run(config)) {
        hexlife_view::log_error("run", err);
        std::process::exit(1);
    }
}

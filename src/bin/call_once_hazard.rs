//! Duke takes ten seconds to build and needs Logger while it does. A second
//! thread that only wants Logger still waits for Duke.
//!
//! Run with: cargo run --bin call_once_hazard

use std::io;

use colored::Colorize;
use once_hazard::{driver, Services, Timeline};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let services = Services::global();
    let timeline = Timeline::new(io::stdout());
    let report = driver::run(services, &timeline);

    let config = services.config();
    println!();
    println!("=== Waits ===");
    println!("get_duke:   {:.1?}", report.duke_wait);
    println!("get_logger: {:.1?}", report.logger_wait);

    if report.logger_stalled_by_duke(config) {
        println!(
            "{}",
            format!(
                "get_logger was held up by Duke's initialization ({:?} Logger delay, {:?} Duke delay)",
                config.logger_delay(),
                config.duke_delay()
            )
            .red()
        );
    } else {
        println!("{}", "get_logger did not wait for Duke this time".green());
    }
}

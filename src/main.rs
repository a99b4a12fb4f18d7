//! tagtrail binary entry point.

use tagtrail::ui::output;

fn main() {
    if let Err(err) = tagtrail::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}

//! rhora main entrypoint.

use rhora::run;
use rhora::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

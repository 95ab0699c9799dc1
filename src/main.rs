//! `touchview` binary: opens the demo viewer, optionally with an options
//! file given as the first argument.

use std::path::Path;

use touchview::options::Options;
use touchview::Viewer;

fn main() {
    env_logger::init();

    let mut builder = Viewer::builder();
    if let Some(path) = std::env::args().nth(1) {
        match Options::load(Path::new(&path)) {
            Ok(options) => builder = builder.with_options(options),
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = builder.build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

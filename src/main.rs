use clap::Parser;
use log::error;

mod app;
mod args;
mod frame_loop;
mod logging;
mod quad;
mod shaders;

use app::App;
use args::ArgsSikrusher;
use logging::init_logging;

fn main() {
    // clion needs help in trait annotation
    let args = <ArgsSikrusher as Parser>::parse();

    init_logging(args.log.as_deref());

    let result = App::new().and_then(|app| app.run(args.shader_policy()));

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(-1);
    }
}

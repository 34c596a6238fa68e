use clap::Parser;
use sigil::cli::args::SigilArgs;

fn main() {
    let args = SigilArgs::parse();
    std::process::exit(sigil::cli::run(args));
}

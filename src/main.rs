use colored::Colorize;
use git_quill::cli;
use git_quill::logger;

#[tokio::main]
async fn main() {
    logger::init();

    let exit_code = tokio::select! {
        code = cli::main() => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("{}", "Interrupted".yellow().bold());
            130
        }
    };

    std::process::exit(exit_code);
}

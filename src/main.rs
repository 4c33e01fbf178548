//! gitea-release binary entry point.

fn main() {
    if let Err(err) = gitea_release::cli::run() {
        gitea_release::cli::report(&err);
        std::process::exit(1);
    }
}

use warden_cpi_install::cli::{exit_code, App, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse_args();

    let result = match App::from_args(&args) {
        Ok(app) => app.run(args).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

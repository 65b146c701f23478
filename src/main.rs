use clap::Parser;

use majazamooz::cli::Cli;
use majazamooz::config::{get_config, init_config};
use majazamooz::errors::MajazamoozError;
use majazamooz::runtime::modes::{self, Mode};
use majazamooz::system::logging::init_logging;
use majazamooz::system::panic_handler::{RunMode, install_panic_hook};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_config();

    match modes::detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            install_panic_hook(RunMode::Server);
            let _guard = init_logging(&get_config().logging)?;
            if let Err(e) = modes::run_server().await {
                if let Some(err) = e.downcast_ref::<MajazamoozError>() {
                    eprintln!("{}", err.format_colored());
                }
                return Err(e);
            }
            Ok(())
        }
        Mode::Cli => {
            install_panic_hook(RunMode::Cli);
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

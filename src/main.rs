use std::{io, str::FromStr};

use actix_web::{App, HttpServer, middleware};
use assetshelf::{conf::ServerConfig, routes::setup_service_config};
use clap::{Command, arg, crate_authors, crate_description, crate_name, crate_version};
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, info};

fn setup_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let colors = ColoredLevelConfig::new()
                .info(Color::BrightGreen)
                .error(Color::BrightRed)
                .warn(Color::BrightYellow);
            out.finish(format_args!(
                "[{}] {}",
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cmd = Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!(","))
        .about(crate_description!())
        .arg(arg!(-c --config <FILE> "Path to a config file").required(false))
        .arg(arg!(-l --log_level <LEVEL> "Sets the logging level").required(false))
        .arg(arg!(-b --bundle <NAME> "Print the URLs of a bundle and exit").required(false))
        .get_matches();

    let config = ServerConfig::load(cmd.get_one::<String>("config").map(String::as_str))
        .map_err(io::Error::other)?;

    let level = match cmd.get_one::<String>("log_level") {
        Some(v) => LevelFilter::from_str(v).map_err(|e| io::Error::other(e.to_string()))?,
        None => LevelFilter::Info,
    };
    if let Err(e) = setup_logger(level, config.general.log_file.as_deref()) {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Some(bundle) = cmd.get_one::<String>("bundle") {
        for url in config.environment().urls(bundle).map_err(io::Error::other)? {
            println!("{}", url);
        }
        return Ok(());
    }

    let bind = (config.general.bind.clone(), config.general.port);
    info!(
        "Serving {} from {:?} on {}:{}",
        config.assets.base_url, config.assets.manifest, bind.0, bind.1
    );

    HttpServer::new(move || {
        let config = config.clone();
        App::new()
            .wrap(middleware::Compress::default())
            .configure(move |f| {
                setup_service_config(f, &config);
            })
    })
    .bind(bind)?
    .run()
    .await
}

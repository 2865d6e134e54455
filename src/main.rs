extern crate hvac_forecast;

use anyhow::Context;
use clap::Parser;
use hvac_forecast::external_conditions::WeatherSeries;
use hvac_forecast::output::FileOutput;
use hvac_forecast::read_weather_file::weather_series_from_csv;
use hvac_forecast::run_forecast;
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct ForecastArgs {
    input_file: String,
    #[arg(
        long,
        short,
        help = "Path to an hourly weather forecast in .csv format, replacing any weather in the input file"
    )]
    weather_file: Option<String>,
    #[arg(
        long,
        short,
        help = "Directory to write results to, by default next to the input file"
    )]
    output_dir: Option<PathBuf>,
    #[clap(long, short, default_value_t = false, help = "Log at debug level")]
    verbose: bool,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

fn main() -> anyhow::Result<()> {
    let args = ForecastArgs::parse();

    let tracing_subscriber = {
        let level = if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(level);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .context("setting tracing subscriber failed")?;

    let input_file = Path::new(args.input_file.as_str());
    let input_file_name = input_file
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("forecast");

    let output_path = match args.output_dir {
        Some(dir) => dir,
        None => input_file.with_file_name(format!("{input_file_name}__results")),
    };
    fs::create_dir_all(&output_path)
        .with_context(|| format!("could not create output directory {output_path:?}"))?;
    let file_output = FileOutput::new(output_path.clone(), format!("{input_file_name}__{{}}"));

    let weather: Option<WeatherSeries> = match args.weather_file {
        Some(ref file) => Some(
            weather_series_from_csv(BufReader::new(File::open(file)?))
                .with_context(|| format!("could not parse the weather file {file}"))?,
        ),
        None => None,
    };

    let input = BufReader::new(
        File::open(input_file).with_context(|| format!("could not open {input_file:?}"))?,
    );

    match run_forecast(input, &file_output, weather)? {
        Some(results) => {
            info!(
                "Forecast HVAC cost ${:.2}, projected monthly bill ${:.2}. Results written to {output_path:?}",
                results.total_hvac_cost(),
                results.bill_projection.monthly_total
            );
            if results.heat_loss.is_degraded() {
                warn!("No usable heat loss factor was found, so the forecast shows no HVAC use");
            }
        }
        None => warn!("Nothing to forecast: the input needs both a building and weather"),
    }

    Ok(())
}

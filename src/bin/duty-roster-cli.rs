#![forbid(unsafe_code)]
use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use duty_roster::{
    calendar, collect_config_issues, compute_stats, export, generate_schedule, io, City,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// 24/7 duty roster generator for a two-city team (no database)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Enable logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the roster and export it
    Generate {
        /// JSON configuration file
        config: PathBuf,
        /// Output directory for all exports
        #[arg(long, short = 'o', default_value = "output")]
        output_dir: PathBuf,
        /// Export format: csv, ics, all
        #[arg(long, short = 'f', default_value = "all")]
        format: String,
        /// Manual holidays YYYY-MM-DD,... used when isdayoff.ru is down
        #[arg(long)]
        holidays: Option<String>,
        /// Skip the isdayoff.ru call entirely
        #[arg(long)]
        offline: bool,
    },

    /// Check a configuration without generating anything
    Validate {
        /// JSON configuration file
        config: PathBuf,
    },

    /// Print the production calendar for a month
    Holidays {
        year: i32,
        month: u32,
        /// Manual holidays YYYY-MM-DD,... used when isdayoff.ru is down
        #[arg(long)]
        holidays: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Generate {
            config,
            output_dir,
            format,
            holidays,
            offline,
        } => {
            let config = io::load_config(&config)?;
            let (errors, warnings) = collect_config_issues(&config);
            print_issues(&errors, &warnings);
            if !errors.is_empty() {
                1
            } else {
                let holiday_set =
                    load_holidays(config.year, config.month, holidays.as_deref(), offline)?;
                println!(
                    "Production calendar: {} non-working days, {} working days",
                    holiday_set.len(),
                    calendar::production_days(config.year, config.month, &holiday_set)
                );

                match generate_schedule(&config, &holiday_set) {
                    Ok(schedule) => {
                        let mut exported: Vec<PathBuf> = Vec::new();
                        let fmt = format.to_ascii_lowercase();
                        if matches!(fmt.as_str(), "csv" | "all") {
                            exported.extend(export::export_csv_workbook(&schedule, &output_dir)?);
                        }
                        if matches!(fmt.as_str(), "ics" | "all") {
                            exported.extend(export::export_ics(&schedule, &output_dir)?);
                        }
                        if exported.is_empty() {
                            eprintln!("unknown format {format:?}; use: csv, ics, all");
                            1
                        } else {
                            let json_path = output_dir.join("schedule.json");
                            io::write_schedule_json(&json_path, &schedule)?;
                            exported.push(json_path);
                            for p in &exported {
                                println!("wrote {}", p.display());
                            }
                            print_summary(&schedule);
                            0
                        }
                    }
                    Err(err) => {
                        eprintln!("generation failed: {err}");
                        1
                    }
                }
            }
        }

        Commands::Validate { config } => {
            let config = io::load_config(&config)?;
            let (errors, warnings) = collect_config_issues(&config);
            print_issues(&errors, &warnings);
            if !errors.is_empty() {
                1
            } else {
                println!(
                    "OK: {:02}.{}, {} employees (duty: {} Moscow, {} Khabarovsk)",
                    config.month,
                    config.year,
                    config.employees.len(),
                    config.duty_count(City::Moscow),
                    config.duty_count(City::Khabarovsk),
                );
                // Code 2 = valid with warnings
                if warnings.is_empty() {
                    0
                } else {
                    2
                }
            }
        }

        Commands::Holidays {
            year,
            month,
            holidays,
        } => {
            let set = load_holidays(year, month, holidays.as_deref(), false)?;
            for day in &set {
                println!("{day}");
            }
            println!(
                "{} non-working days, {} working days",
                set.len(),
                calendar::production_days(year, month, &set)
            );
            0
        }
    };

    std::process::exit(code);
}

/// Production calendar with the original fallback chain: isdayoff.ru, then
/// the manual list, then plain weekends.
fn load_holidays(
    year: i32,
    month: u32,
    manual: Option<&str>,
    offline: bool,
) -> Result<BTreeSet<NaiveDate>> {
    if !offline {
        match calendar::fetch_holidays(year, month) {
            Ok(set) => return Ok(set),
            Err(err) => eprintln!("warning: {err}"),
        }
    }
    if let Some(raw) = manual {
        let mut set = calendar::parse_manual_holidays(raw, year, month)?;
        set.extend(calendar::weekends_only(year, month));
        return Ok(set);
    }
    eprintln!("warning: using weekends only; pass --holidays for the exact calendar");
    Ok(calendar::weekends_only(year, month))
}

fn print_issues(errors: &[String], warnings: &[String]) {
    for msg in errors {
        eprintln!("error: {msg}");
    }
    for msg in warnings {
        eprintln!("warning: {msg}");
    }
}

fn print_summary(schedule: &duty_roster::Schedule) {
    println!(
        "{:<16} {:>5} {:>6} {:>4} {:>4} {:>4} {:>4} {:>5} {:>5}",
        "employee", "work", "target", "M", "E", "N", "W", "wknd", "iso"
    );
    for s in compute_stats(schedule) {
        println!(
            "{:<16} {:>5} {:>6} {:>4} {:>4} {:>4} {:>4} {:>5} {:>5}",
            s.name,
            s.total_working,
            s.target,
            s.morning,
            s.evening,
            s.night,
            s.workday,
            s.weekend_work,
            s.isolated_off
        );
    }
}

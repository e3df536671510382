#![deny(clippy::unwrap_used)]

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::Local;
use clap::{arg, command, value_parser};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::process::exit;
use tapectrl::measurement::Reading;
use tapectrl::proto::notification::Notification;
use tapectrl::session::Session;
use tapectrl::{Device, ProtoError, Result, DEFAULT_BAUDRATE, DEFAULT_TTY};

#[derive(Debug, Copy, Clone)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

impl clap::ValueEnum for OutputFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Text, Self::Json, Self::Csv]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Text => clap::builder::PossibleValue::new("text"),
            Self::Json => clap::builder::PossibleValue::new("json"),
            Self::Csv => clap::builder::PossibleValue::new("csv"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command!() // requires `cargo` feature
        .arg(
            arg!(
                -p --device <PORT> "Port delivering the raw notification bytes"
            )
            .default_value(DEFAULT_TTY)
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(
                -b --baudrate <BAUDRATE> "Baudrate"
            )
            .default_value(DEFAULT_BAUDRATE.to_string())
            .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(
                -i --input <FILE> "Read raw frames from a file or pipe instead of a serial port"
            )
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            clap::Command::new("watch")
                .about("Follow live readings and collect confirmed measurements")
                .arg(
                    arg!(-f --format <FORMAT> "Output format")
                        .value_parser(value_parser!(OutputFormat)),
                )
                .arg(
                    arg!(--fifo <PATH> "Write live values as little-endian f64 to a file or pipe")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            clap::Command::new("decode")
                .about("Decode a single raw frame and print its fields")
                .arg(arg!(<FRAME> "Raw frame text, e.g. '*15000;0;00SM'"))
                .arg(
                    arg!(-f --format <FORMAT> "Output format")
                        .value_parser(value_parser!(OutputFormat)),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("decode", args)) => {
            let frame = args.get_one::<String>("FRAME").expect("required");
            let format = args
                .get_one::<OutputFormat>("format")
                .unwrap_or(&OutputFormat::Text);

            match frame.parse::<Notification>() {
                Ok(note) => match format {
                    OutputFormat::Text => {
                        let reading = Reading::from(&note);
                        println!("raw value: {} (cm x 100)", note.value);
                        println!("reading:   {:#}", reading);
                        println!("confirmed: {}", note.confirmed);
                    }
                    OutputFormat::Json => {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&note).expect("JSON serialization failed")
                        );
                    }
                    OutputFormat::Csv => {
                        eprintln!("CSV output is only available for watch");
                        exit(2);
                    }
                },
                Err(err) => {
                    eprintln!("Error: unrecognized frame: {}", err);
                    exit(1);
                }
            }
        }

        Some(("watch", args)) => {
            let mut device = match matches.get_one::<PathBuf>("input") {
                Some(fpath) => Device::from_reader(tokio::fs::File::open(fpath).await?),
                None => {
                    let port = matches
                        .get_one::<PathBuf>("device")
                        .expect("defaulted")
                        .display()
                        .to_string();
                    let baudrate = *matches.get_one::<u32>("baudrate").expect("defaulted");
                    let device = Device::new(&port, baudrate)?;
                    eprintln!("Connected to: {}", port);
                    device
                }
            };

            let format = args
                .get_one::<OutputFormat>("format")
                .unwrap_or(&OutputFormat::Text);

            let mut fifo = args
                .get_one::<PathBuf>("fifo")
                .map(File::create)
                .transpose()?;

            let mut session = Session::new();
            let mut csv_output = None;
            let mut c = 1;

            eprintln!("Receiving frames...");
            loop {
                match device.next_notification().await {
                    Ok(Some(note)) => {
                        let update = session.process(note);

                        match format {
                            OutputFormat::Text => {
                                println!(
                                    "#{:0>4} {} {:#}",
                                    c,
                                    Local::now().format("%H:%M:%S"),
                                    update.reading
                                );
                                if update.just_confirmed {
                                    println!("      saved #{:0>3}", session.log().len());
                                }
                            }
                            OutputFormat::Json => {
                                println!(
                                    "{}",
                                    serde_json::to_string(&update)
                                        .expect("JSON serialization failed")
                                );
                            }
                            OutputFormat::Csv => {
                                if update.just_confirmed {
                                    let writer = csv_output.get_or_insert_with(|| {
                                        csv::Writer::from_writer(std::io::stdout())
                                    });
                                    if let Some(entry) = session.log().last() {
                                        writer.serialize(entry).expect("Writing CSV failed");
                                        writer.flush()?;
                                    }
                                }
                            }
                        }

                        if let Some(binout) = &mut fifo {
                            binout.write_f64::<LittleEndian>(update.reading.value)?;
                        }

                        c += 1;
                    }
                    Ok(None) => {
                        eprintln!("--- LINK CLOSED ---");
                        break;
                    }
                    // A dropped frame; the session is left untouched.
                    Err(ProtoError::Frame(err)) => {
                        eprintln!("Error: unrecognized frame: {}", err);
                    }
                    Err(err) => {
                        eprintln!("Error: {}", err);
                        break;
                    }
                }
            }

            if matches!(format, OutputFormat::Text) && !session.log().is_empty() {
                println!("\nConfirmed measurements:");
                for (i, entry) in session.log().iter().enumerate() {
                    println!("#{:0>3} {:.2} {}", i + 1, entry.value, entry.unit);
                }
            }
        }

        _ => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "Unsupported command line argument",
            )
            .into());
        }
    }

    Ok(())
}

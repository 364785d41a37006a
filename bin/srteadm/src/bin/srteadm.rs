// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use tabwriter::TabWriter;

use srte::api::Comparator;
use srte::api::HookCfg;
use srte::api::Ipv6Addr;
use srte::api::METRIC_SELECTOR_IFACE;
use srte::api::Sid;
use srte::api::SkipArgs;
use srte::api::SkipIfArgs;
use srte::print::print_metrics_into;
use srte::print::print_packet_into;
use srte::print::print_sid;
use srte::print::print_stats;
use srte::provider::LogProvider;
use srte::provider::NullLog;
use srte::provider::PrintlnLog;
use srteadm::load_config;
use srteadm::parse_hex;
use srteadm::parse_metric;
use srteadm::pkg_version;
use srteadm::run_packet;

/// Administer and exercise the srte SRv6 egress hook.
#[derive(Debug, Parser)]
#[command(version = pkg_version())]
struct Cli {
    /// Print the hook's event log to stdout.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode the function and argument carried by a SID.
    DecodeSid { addr: Ipv6Addr },

    /// Encode a policy SID under a locator.
    EncodeSid {
        /// The locator; its low 64 bits are replaced.
        locator: Ipv6Addr,

        #[command(subcommand)]
        policy: PolicyCmd,
    },

    /// Run a single IPv6 packet through the hook.
    Run {
        /// A TOML hook configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Publish a metric value, as IFACE=VALUE. May be repeated.
        #[arg(short, long = "metric", value_parser = parse_metric)]
        metrics: Vec<(u32, u64)>,

        /// Emit the result as JSON.
        #[arg(long)]
        json: bool,

        /// The packet, starting at the IPv6 header, in hex.
        packet: String,
    },
}

#[derive(Debug, Subcommand)]
enum PolicyCmd {
    /// Always skip `num-skip` segments past the next one.
    Skip {
        #[arg(long)]
        num_skip: u8,
    },

    /// Skip `num-skip` segments if an interface metric compares true
    /// against a threshold.
    SkipIf {
        #[arg(long)]
        num_skip: u8,

        #[arg(long)]
        iface: u8,

        /// One of eq, gt, lt.
        #[arg(long)]
        cmp: Comparator,

        #[arg(long)]
        threshold: u16,

        #[arg(long, default_value_t = METRIC_SELECTOR_IFACE)]
        selector: u8,
    },
}

impl PolicyCmd {
    fn sid(&self) -> Sid {
        match *self {
            Self::Skip { num_skip } => SkipArgs { num_skip }.sid(),
            Self::SkipIf { num_skip, iface, cmp, threshold, selector } => {
                SkipIfArgs {
                    num_skip,
                    metric_selector: selector,
                    comparator: cmp,
                    iface,
                    threshold,
                }
                .sid()
            }
        }
    }
}

fn print_section(t: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(t, "\n{title}")?;
    srte::print::write_hr(t)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log: Arc<dyn LogProvider> =
        if cli.debug { Arc::new(PrintlnLog) } else { Arc::new(NullLog) };

    match cli.cmd {
        Command::DecodeSid { addr } => {
            print_sid(&addr)?;
        }

        Command::EncodeSid { locator, policy } => {
            println!("{}", policy.sid().encode(locator));
        }

        Command::Run { config, metrics, json, packet } => {
            let cfg = match config {
                Some(path) => load_config(&path)?,
                None => HookCfg::default(),
            };
            let bytes = parse_hex(&packet)?;

            let mut out = io::stdout();
            if !json {
                print_section(&mut out, "Input")?;
                print_packet_into(&mut out, &bytes)?;
            }

            let (report, bytes) = run_packet(cfg, &metrics, bytes, log)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            print_section(&mut out, "Output")?;
            print_packet_into(&mut out, &bytes)?;

            print_section(&mut out, "Result")?;
            let mut t = TabWriter::new(&mut out);
            writeln!(t, "VERDICT\t{}", report.verdict)?;
            if let Some(reason) = &report.reason {
                writeln!(t, "REASON\t{reason}")?;
            }
            t.flush()?;
            drop(t);

            print_section(&mut out, "Metrics")?;
            print_metrics_into(&mut out, report.metric_unit, &report.metrics)?;

            print_section(&mut out, "Stats")?;
            print_stats(&report.stats)?;
        }
    }

    Ok(())
}

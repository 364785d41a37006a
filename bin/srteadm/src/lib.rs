// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! srte administration library.
//!
//! Loads hook configuration, parses operator input and runs single
//! packets through an [`XmitHook`] for inspection.

use serde::Serialize;
use srte::api::HookCfg;
use srte::api::HookStatsSnap;
use srte::api::MetricUnit;
use srte::api::Verdict;
use srte::d_error::ErrorBlock;
use srte::engine::HookCreateError;
use srte::engine::IfaceMetrics;
use srte::engine::Packet;
use srte::engine::ProcessResult;
use srte::engine::XmitHook;
use srte::engine::metrics::MetricsError;
use srte::provider::LogProvider;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Major version of srteadm.
pub const MAJOR_VERSION: u64 = 0;

/// Errors related to administering srte.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path}: {source}")]
    ReadConfig { path: String, source: std::io::Error },

    #[error("invalid config {path}: {source}")]
    ParseConfig { path: String, source: toml::de::Error },

    #[error("invalid packet hex: {0}")]
    BadHex(String),

    #[error("invalid metric {0:?}: expected IFACE=VALUE")]
    BadMetric(String),

    #[error("{0}")]
    Metrics(MetricsError),

    #[error("{0}")]
    Hook(HookCreateError),
}

impl From<MetricsError> for Error {
    fn from(err: MetricsError) -> Self {
        Self::Metrics(err)
    }
}

impl From<HookCreateError> for Error {
    fn from(err: HookCreateError) -> Self {
        Self::Hook(err)
    }
}

/// Return the package version string reported by `--version`.
pub fn pkg_version() -> String {
    format!("{MAJOR_VERSION}.{}", srte::api::API_VERSION)
}

/// Read a [`HookCfg`] from a TOML file. Missing keys take their
/// defaults.
pub fn load_config(path: &Path) -> Result<HookCfg, Error> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        Error::ReadConfig { path: path.display().to_string(), source }
    })?;
    toml::from_str(&text).map_err(|source| Error::ParseConfig {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a packet given as hex. Whitespace, `:` and a leading `0x` are
/// ignored.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, Error> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let digits: Vec<u8> = s
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(Error::BadHex(format!(
            "odd number of digits ({})",
            digits.len()
        )));
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)
                .map_err(|_| Error::BadHex("non-ASCII input".into()))?;
            u8::from_str_radix(pair, 16)
                .map_err(|_| Error::BadHex(format!("bad byte {pair:?}")))
        })
        .collect()
}

/// Render bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse an `IFACE=VALUE` metric assignment.
pub fn parse_metric(s: &str) -> Result<(u32, u64), Error> {
    let bad = || Error::BadMetric(s.to_string());
    let (iface, val) = s.split_once('=').ok_or_else(bad)?;
    let iface = iface.trim().parse().map_err(|_| bad())?;
    let val = val.trim().parse().map_err(|_| bad())?;
    Ok((iface, val))
}

/// The outcome of running one packet, in a form fit for printing or
/// serializing.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub verdict: Verdict,
    /// The flattened drop reason, when dropped.
    pub reason: Option<String>,
    /// The packet bytes after processing, as hex.
    pub packet: String,
    pub stats: HookStatsSnap,
    pub metric_unit: MetricUnit,
    /// The published `(iface, value)` metrics the hook ran against.
    pub metrics: Vec<(u32, u64)>,
}

/// Run `bytes` through a fresh hook built from `cfg`, with the given
/// metrics published.
pub fn run_packet(
    cfg: HookCfg,
    metrics: &[(u32, u64)],
    bytes: Vec<u8>,
    log: Arc<dyn LogProvider>,
) -> Result<(RunReport, Vec<u8>), Error> {
    let store = Arc::new(IfaceMetrics::new(cfg.max_ifaces, cfg.metric_unit));
    for (iface, val) in metrics {
        store.set(*iface, *val)?;
    }

    let hook = XmitHook::new("srteadm", cfg, store.clone(), log)?;
    let mut pkt = Packet::from(bytes);
    let res = hook.process(&mut pkt);

    let reason = match &res {
        ProcessResult::Drop { reason } => {
            let eb = ErrorBlock::<8>::from_err(reason).unwrap_or_else(|eb| eb);
            Some(eb.to_string())
        }
        _ => None,
    };

    let bytes = pkt.into_bytes();
    let report = RunReport {
        verdict: res.verdict(),
        reason,
        packet: to_hex(&bytes),
        stats: hook.stats(),
        metric_unit: hook.cfg().metric_unit,
        metrics: store.entries(),
    };
    Ok((report, bytes))
}

#[cfg(test)]
mod test {
    use super::*;
    use srte::api::Ipv6Addr;
    use srte::api::ProgramCfg;
    use srte::provider::NullLog;

    #[test]
    fn version() {
        assert_eq!(pkg_version(), "0.1");
    }

    #[test]
    fn hex() {
        assert_eq!(parse_hex("0x60 00:0a ff").unwrap(), [0x60, 0x00, 0x0a, 0xff]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert!(matches!(parse_hex("abc"), Err(Error::BadHex(_))));
        assert!(matches!(parse_hex("zz"), Err(Error::BadHex(_))));
        assert_eq!(to_hex(&[0x60, 0x0a]), "600a");
    }

    #[test]
    fn metric() {
        assert_eq!(parse_metric("3=150").unwrap(), (3, 150));
        assert_eq!(parse_metric(" 3 = 150 ").unwrap(), (3, 150));
        assert!(matches!(parse_metric("3"), Err(Error::BadMetric(_))));
        assert!(matches!(parse_metric("x=1"), Err(Error::BadMetric(_))));
        assert!(matches!(parse_metric("1=-1"), Err(Error::BadMetric(_))));
    }

    #[test]
    fn config() {
        let cfg: HookCfg = toml::from_str(
            r#"
            metric_unit = "bits-per-sec"

            [program]
            kind = "rewrite-dst"
            match_dst = "fc00:a:ff::"
            new_dst = "fc00:a:21::"
            "#,
        )
        .unwrap();

        let match_dst: Ipv6Addr = "fc00:a:ff::".parse().unwrap();
        let new_dst: Ipv6Addr = "fc00:a:21::".parse().unwrap();
        assert_eq!(cfg.program, ProgramCfg::RewriteDst { match_dst, new_dst });
        assert_eq!(cfg.metric_unit, MetricUnit::BitsPerSec);
        assert_eq!(cfg.max_ifaces, HookCfg::DEFAULT_MAX_IFACES);

        let cfg: HookCfg = toml::from_str("").unwrap();
        assert_eq!(cfg, HookCfg::default());
    }

    #[test]
    fn run_short_packet() {
        let (report, bytes) =
            run_packet(HookCfg::default(), &[], vec![0x60; 8], Arc::new(NullLog))
                .unwrap();
        assert_eq!(report.verdict, Verdict::Drop);
        assert_eq!(
            report.reason.as_deref(),
            Some("Truncated::NotEnoughBytes(40, 8)")
        );
        assert_eq!(bytes, [0x60; 8]);
        assert_eq!(report.stats.dropped, 1);
    }

    #[test]
    fn run_reports_published_metrics() {
        let cfg =
            HookCfg { metric_unit: MetricUnit::Bytes, ..Default::default() };
        let (report, _) =
            run_packet(cfg, &[(4, 2048), (1, 7)], vec![], Arc::new(NullLog))
                .unwrap();
        assert_eq!(report.metric_unit, MetricUnit::Bytes);
        assert_eq!(report.metrics, [(1, 7), (4, 2048)]);
    }

    #[test]
    fn run_metric_out_of_range() {
        let cfg = HookCfg { max_ifaces: 2, ..Default::default() };
        assert!(matches!(
            run_packet(cfg, &[(2, 1)], vec![], Arc::new(NullLog)),
            Err(Error::Metrics(_))
        ));
    }
}

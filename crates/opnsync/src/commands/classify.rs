//! `opnsync classify` — score reservations offline.

use serde::Serialize;
use tabled::Tabled;

use opnsync_core::{Classifier, DhcpReservation};

use crate::cli::{ClassifyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct Scored {
    mac: String,
    ip: String,
    hostname: String,
    is_shelly: bool,
    confidence: f64,
}

#[derive(Tabled)]
struct ScoredRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Shelly")]
    is_shelly: &'static str,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&Scored> for ScoredRow {
    fn from(s: &Scored) -> Self {
        Self {
            mac: s.mac.clone(),
            ip: s.ip.clone(),
            hostname: util::or_dash(&s.hostname),
            is_shelly: if s.is_shelly { "yes" } else { "no" },
            confidence: format!("{:.2}", s.confidence),
        }
    }
}

fn score(
    classifier: &Classifier,
    reservations: Vec<DhcpReservation>,
    only_shelly: bool,
) -> Vec<Scored> {
    reservations
        .into_iter()
        .filter_map(|r| {
            let class = classifier.identify(&r);
            (!only_shelly || class.is_shelly).then(|| Scored {
                mac: r.mac,
                ip: r.ip,
                hostname: r.hostname,
                is_shelly: class.is_shelly,
                confidence: class.confidence,
            })
        })
        .collect()
}

pub fn handle(args: &ClassifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let reservations: Vec<DhcpReservation> = util::read_data_file(&args.file)?;
    let classifier = Classifier::new(&args.keywords);
    let scored = score(&classifier, reservations, args.only_shelly);

    let out = output::render_list(&global.output, &scored, |s| ScoredRow::from(s), |s| {
        s.mac.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_to_shelly_devices() {
        let reservations = vec![
            DhcpReservation::new("c4:5b:be:00:00:01", "10.0.0.1", "shelly-plug"),
            DhcpReservation::new("00:11:22:33:44:55", "10.0.0.2", "printer"),
        ];
        let all = score(&Classifier::default(), reservations.clone(), false);
        assert_eq!(all.len(), 2);
        assert!(all[0].is_shelly);
        assert!(!all[1].is_shelly);

        let only = score(&Classifier::default(), reservations, true);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].hostname, "shelly-plug");
    }
}

// ── Shelly device classification ──
//
// Scores a router reservation on how likely it is to be a Shelly device,
// from hostname/description keywords and the MAC vendor prefix. Keyword and
// OUI tables are owned by the `Classifier` value; there is no global state.

use serde::Serialize;

use crate::model::DhcpReservation;

const HOSTNAME_WEIGHT: f64 = 0.4;
const DESCRIPTION_WEIGHT: f64 = 0.3;
const OUI_WEIGHT: f64 = 0.6;
const CONFIDENCE_THRESHOLD: f64 = 0.5;

pub const DEFAULT_KEYWORDS: &[&str] = &["shelly", "allterco", "shellyplus", "shelly1", "shelly2"];

/// Espressif prefixes seen on Shelly hardware.
pub const DEFAULT_OUI_PREFIXES: &[&str] = &[
    "c45bbe", "e868e7", "8caab5", "3c6105", "98cdac", "a4cf12", "e09806", "ecfabc",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub is_shelly: bool,
    /// Always within `0.0..=1.0`.
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: Vec<String>,
    oui_prefixes: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl Classifier {
    /// Classifier with the given keywords; an empty list means the defaults.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            keywords = DEFAULT_KEYWORDS.iter().map(|k| (*k).to_owned()).collect();
        }

        Self {
            keywords,
            oui_prefixes: DEFAULT_OUI_PREFIXES.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    /// Replace the vendor-prefix table. Prefixes may use any MAC notation.
    pub fn with_oui_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.oui_prefixes = prefixes
            .into_iter()
            .map(|p| crate::model::normalize_mac(p.as_ref()))
            .collect();
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn identify(&self, reservation: &DhcpReservation) -> Classification {
        let hostname = reservation.hostname.to_lowercase();
        let description = reservation.description.to_lowercase();

        let mut confidence = 0.0_f64;
        let mut matches = 0_usize;

        for keyword in &self.keywords {
            if hostname.contains(keyword.as_str()) {
                confidence += HOSTNAME_WEIGHT;
                matches += 1;
            }
            if description.contains(keyword.as_str()) {
                confidence += DESCRIPTION_WEIGHT;
                matches += 1;
            }
        }

        let mac = reservation.mac_key();
        if mac
            .oui()
            .is_some_and(|oui| self.oui_prefixes.iter().any(|p| p == oui))
        {
            confidence += OUI_WEIGHT;
            matches += 1;
        }

        let confidence = confidence.min(1.0);
        Classification {
            is_shelly: confidence > CONFIDENCE_THRESHOLD || matches >= 2,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(mac: &str, hostname: &str, description: &str) -> DhcpReservation {
        let mut r = DhcpReservation::new(mac, "192.168.1.10", hostname);
        r.description = description.into();
        r
    }

    #[test]
    fn shelly_hostname_without_oui_is_shelly() {
        let c = Classifier::default().identify(&reservation(
            "00:11:22:33:44:55",
            "shelly1pm-abcdef",
            "",
        ));
        // "shelly" and "shelly1" both hit the hostname.
        assert!(c.is_shelly);
        assert!((c.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn oui_alone_is_enough() {
        let c = Classifier::default().identify(&reservation("E8:68:E7:01:02:03", "esp-device", ""));
        assert!(c.is_shelly);
        assert!((c.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn single_description_hit_is_not_enough() {
        let c = Classifier::default().identify(&reservation(
            "00:11:22:33:44:55",
            "printer",
            "near the allterco box",
        ));
        assert!(!c.is_shelly);
        assert!((c.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_clamped() {
        let c = Classifier::default().identify(&reservation(
            "c4:5b:be:00:00:01",
            "shellyplus1-shelly2-allterco",
            "shelly shellyplus allterco",
        ));
        assert!(c.is_shelly);
        assert!(c.confidence <= 1.0);
        assert!(c.confidence >= 0.0);
    }

    #[test]
    fn custom_tables_replace_defaults() {
        let classifier = Classifier::new(["plug"]).with_oui_prefixes(["00-11-22"]);
        assert_eq!(classifier.keywords(), ["plug"]);

        let c = classifier.identify(&reservation("00:11:22:33:44:55", "shelly1", ""));
        assert!(c.is_shelly);
        assert!((c.confidence - 0.6).abs() < 1e-9);

        let c = classifier.identify(&reservation("aa:11:22:33:44:55", "shelly1", ""));
        assert!(!c.is_shelly);
    }

    #[test]
    fn empty_keyword_list_uses_defaults() {
        let classifier = Classifier::new(Vec::<String>::new());
        assert_eq!(classifier.keywords().len(), DEFAULT_KEYWORDS.len());
    }
}

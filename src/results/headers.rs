use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Remove inline markup tags (`<i>`, `<sub>`, ...) while keeping the text between them.
pub fn strip_markup(raw: &str) -> String {
    MARKUP_TAG.replace_all(raw, "").into_owned()
}

/// Built-in aliases for the quantity columns of bus and branch tables
const POWER_FLOW_ALIASES: &[(&str, &str)] = &[
    ("<i>V</i><sub>m</sub> / pu", "Vm(pu)"),
    ("<i>V</i><sub>a</sub> / deg", "Va(deg)"),
    ("<i>P</i><sub>gen</sub> / MW", "Pgen(MW)"),
    ("<i>Q</i><sub>gen</sub> / MVar", "Qgen(MVar)"),
    ("<i>P</i><sub>load</sub> / MW", "Pload(MW)"),
    ("<i>Q</i><sub>load</sub> / MVar", "Qload(MVar)"),
    ("<i>P</i><sub>shunt</sub> / MW", "Pshunt(MW)"),
    ("<i>Q</i><sub>shunt</sub> / MVar", "Qshunt(MVar)"),
    ("<i>P</i><sub>res</sub> / MW", "Pres(MW)"),
    ("<i>Q</i><sub>res</sub> / MVar", "Qres(MVar)"),
    ("<i>P</i><sub>ij</sub> / MW", "Pij(MW)"),
    ("<i>Q</i><sub>ij</sub> / MVar", "Qij(MVar)"),
    ("<i>P</i><sub>ji</sub> / MW", "Pji(MW)"),
    ("<i>Q</i><sub>ji</sub> / MVar", "Qji(MVar)"),
    ("<i>P</i><sub>loss</sub> / MW", "Ploss(MW)"),
    ("<i>Q</i><sub>loss</sub> / MVar", "Qloss(MVar)"),
];

/// Exact raw label -> display alias. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct HeaderAliases {
    entries: HashMap<String, String>,
}

impl HeaderAliases {
    /// The standard bus/branch quantity aliases
    pub fn power_flow() -> Self {
        Self::from_pairs(POWER_FLOW_ALIASES.iter().copied())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add or replace entries; later entries win
    pub fn with_overrides<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.entries
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns raw runner column labels into display headers
#[derive(Debug, Clone, Default)]
pub struct HeaderNormalizer {
    aliases: HeaderAliases,
}

impl HeaderNormalizer {
    pub fn new(aliases: HeaderAliases) -> Self {
        Self { aliases }
    }

    /// Exact, case-sensitive alias lookup; unmapped labels are markup-stripped.
    pub fn alias(&self, raw: &str) -> String {
        match self.aliases.get(raw) {
            Some(alias) => alias.to_string(),
            None => strip_markup(raw),
        }
    }
}

//! Output of a finished search.

use serde::Serialize;
use crate::error::Result;
use crate::fingerprint::FingerprintContext;
use crate::search::SearchStats;
use crate::top_k::Hit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// one identifier per line, best first
    #[default]
    Plain,
    Yaml,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportHit {
    pub tag: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub query: String,
    pub fp_type: String,
    pub metric: String,
    pub stats: SearchStats,
    pub hits: Vec<ReportHit>,
}

impl Report {

    pub fn new<T>(query: &str, ctx: &FingerprintContext, stats: SearchStats, hits: &[Hit<T>]) -> Self {

        let hits = hits
            .iter()
            .map(|h| ReportHit { tag: h.tag.clone(), score: h.score })
            .collect();

        return Self {
            query: query.to_string(),
            fp_type: ctx.fp_type.to_string(),
            metric: ctx.metric.to_string(),
            stats,
            hits,
        };
    }

    pub fn to_plain(&self) -> String {

        let mut s = String::new();
        for hit in self.hits.iter() {
            s += &hit.tag;
            s += "\n";
        }

        s
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {

        match format {
            OutputFormat::Plain => Ok(self.to_plain()),
            OutputFormat::Yaml => self.to_yaml(),
            OutputFormat::Json => self.to_json().map(|s| s + "\n"),
        }
    }
}

//! Node catalog: palette metadata and default configuration per node kind
//!
//! The catalog is a static, read-only table. It is consulted once per node,
//! when the node is created, to obtain the node's starting `data`. Types
//! outside the closed [`NodeKind`] enumeration fall back to a bare label.
//!
//! Defaults are declared as typed records ([`NodeConfig`]) and flattened
//! into the scalar [`NodeData`] bag that nodes carry at runtime.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{DataValue, NodeData, NodeKind, NodeType};

/// Palette grouping for a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Trigger,
    Orchestration,
    DataSource,
    Analysis,
    Lifecycle,
    Output,
}

/// Palette metadata for a node kind
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub kind: NodeKind,
    pub category: NodeCategory,
    pub label: &'static str,
    pub description: &'static str,
}

/// Look up the palette entry for a kind
pub fn entry(kind: NodeKind) -> CatalogEntry {
    let (category, label, description) = match kind {
        NodeKind::Trigger => (
            NodeCategory::Trigger,
            "Trigger",
            "Starts the workflow on a schedule or market event",
        ),
        NodeKind::Orchestrator => (
            NodeCategory::Orchestration,
            "AI Orchestrator",
            "Routes work between agents and merges their findings",
        ),
        NodeKind::MarketData => (
            NodeCategory::DataSource,
            "Market Data",
            "Streams prices and volumes for a symbol",
        ),
        NodeKind::NewsFeed => (
            NodeCategory::DataSource,
            "News Feed",
            "Collects headlines from financial news wires",
        ),
        NodeKind::SecFilings => (
            NodeCategory::DataSource,
            "SEC Filings",
            "Watches EDGAR for new company filings",
        ),
        NodeKind::SocialSentiment => (
            NodeCategory::DataSource,
            "Social Sentiment",
            "Samples social media chatter about a ticker",
        ),
        NodeKind::EarningsCalls => (
            NodeCategory::DataSource,
            "Earnings Calls",
            "Pulls earnings call transcripts",
        ),
        NodeKind::AlternativeData => (
            NodeCategory::DataSource,
            "Alternative Data",
            "Imports web traffic, app usage and card spend panels",
        ),
        NodeKind::SentimentAnalysis => (
            NodeCategory::Analysis,
            "Sentiment Analysis",
            "Scores text for bullish or bearish tone",
        ),
        NodeKind::TechnicalAnalysis => (
            NodeCategory::Analysis,
            "Technical Analysis",
            "Computes indicators over price history",
        ),
        NodeKind::FundamentalAnalysis => (
            NodeCategory::Analysis,
            "Fundamental Analysis",
            "Evaluates financial statements and ratios",
        ),
        NodeKind::RiskAssessment => (
            NodeCategory::Analysis,
            "Risk Assessment",
            "Estimates value at risk and drawdown exposure",
        ),
        NodeKind::PortfolioOptimization => (
            NodeCategory::Analysis,
            "Portfolio Optimization",
            "Rebalances weights against a target objective",
        ),
        NodeKind::LlmAnalysis => (
            NodeCategory::Analysis,
            "LLM Analysis",
            "Asks a language model to summarise the inputs",
        ),
        NodeKind::DealSourcing => (
            NodeCategory::Lifecycle,
            "Deal Sourcing",
            "Finds candidate companies matching a thesis",
        ),
        NodeKind::Screening => (
            NodeCategory::Lifecycle,
            "Screening",
            "Filters candidates against investment criteria",
        ),
        NodeKind::DueDiligence => (
            NodeCategory::Lifecycle,
            "Due Diligence",
            "Runs diligence checklists across key areas",
        ),
        NodeKind::ValuationModeling => (
            NodeCategory::Lifecycle,
            "Valuation Modeling",
            "Builds valuation ranges from several methods",
        ),
        NodeKind::InvestmentCommittee => (
            NodeCategory::Lifecycle,
            "Investment Committee",
            "Prepares the memo and records the committee vote",
        ),
        NodeKind::PortfolioMonitoring => (
            NodeCategory::Lifecycle,
            "Portfolio Monitoring",
            "Tracks KPIs of held positions",
        ),
        NodeKind::ExitPlanning => (
            NodeCategory::Lifecycle,
            "Exit Planning",
            "Compares exit routes and timing",
        ),
        NodeKind::Alert => (
            NodeCategory::Output,
            "Alert",
            "Notifies a channel when a threshold is crossed",
        ),
        NodeKind::Output => (
            NodeCategory::Output,
            "Output",
            "Publishes the workflow result",
        ),
        NodeKind::Report => (
            NodeCategory::Output,
            "Report",
            "Compiles findings into a scheduled report",
        ),
    };

    CatalogEntry {
        kind,
        category,
        label,
        description,
    }
}

/// All palette entries, in palette order
pub fn entries() -> Vec<CatalogEntry> {
    NodeKind::ALL.iter().copied().map(entry).collect()
}

/// Palette entries grouped by category
pub fn by_category() -> BTreeMap<NodeCategory, Vec<CatalogEntry>> {
    let mut grouped: BTreeMap<NodeCategory, Vec<CatalogEntry>> = BTreeMap::new();
    for entry in entries() {
        grouped.entry(entry.category).or_default().push(entry);
    }
    grouped
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    pub schedule: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub model: String,
    pub strategy: String,
    pub max_parallel: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceConfig {
    pub source: String,
    pub interval: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub model: String,
    pub indicators: String,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    pub channel: String,
    pub threshold: f64,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: String,
    pub destination: String,
}

/// Stage-specific defaults for investment lifecycle nodes
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleConfig {
    DealSourcing { sectors: String, min_revenue: String, geography: String },
    Screening { criteria: String, pass_threshold: f64 },
    DueDiligence { diligence_areas: String, depth: String },
    ValuationModeling { valuation_methods: String, discount_rate: String },
    InvestmentCommittee { quorum: u32, voting_rule: String },
    PortfolioMonitoring { kpis: String, review_cadence: String },
    ExitPlanning { exit_options: String, target_horizon: String },
}

/// Typed default configuration, one shape per family of node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    Orchestrator(OrchestratorConfig),
    DataSource(DataSourceConfig),
    Analysis(AnalysisConfig),
    Lifecycle(LifecycleConfig),
    Alert(AlertConfig),
    Output(OutputConfig),
}

fn text(s: &str) -> DataValue {
    DataValue::Text(s.to_string())
}

fn data_source(source: &str, interval: &str, symbol: &str) -> NodeConfig {
    NodeConfig::DataSource(DataSourceConfig {
        source: source.to_string(),
        interval: interval.to_string(),
        symbol: symbol.to_string(),
    })
}

fn analysis(model: &str, indicators: &str, confidence_threshold: f64) -> NodeConfig {
    NodeConfig::Analysis(AnalysisConfig {
        model: model.to_string(),
        indicators: indicators.to_string(),
        confidence_threshold,
    })
}

impl NodeConfig {
    /// Default configuration for a kind
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Trigger => NodeConfig::Trigger(TriggerConfig {
                schedule: "0 9 * * 1-5".to_string(),
                timezone: "America/New_York".to_string(),
            }),
            NodeKind::Orchestrator => NodeConfig::Orchestrator(OrchestratorConfig {
                model: "gpt-4o".to_string(),
                strategy: "parallel".to_string(),
                max_parallel: 4,
            }),
            NodeKind::MarketData => data_source("polygon", "1m", "SPY"),
            NodeKind::NewsFeed => data_source("reuters", "5m", "SPY"),
            NodeKind::SecFilings => data_source("edgar", "1h", "AAPL"),
            NodeKind::SocialSentiment => data_source("reddit", "15m", "TSLA"),
            NodeKind::EarningsCalls => data_source("transcripts", "1d", "MSFT"),
            NodeKind::AlternativeData => data_source("similarweb", "1d", "AMZN"),
            NodeKind::SentimentAnalysis => analysis("finbert", "polarity,subjectivity", 0.7),
            NodeKind::TechnicalAnalysis => analysis("indicators", "RSI,MACD,SMA", 0.6),
            NodeKind::FundamentalAnalysis => analysis("gpt-4o", "P/E,EV/EBITDA,ROE", 0.65),
            NodeKind::RiskAssessment => analysis("monte-carlo", "VaR,CVaR,beta", 0.95),
            NodeKind::PortfolioOptimization => analysis("mean-variance", "sharpe,volatility", 0.8),
            NodeKind::LlmAnalysis => analysis("claude-3-5-sonnet", "summary", 0.75),
            NodeKind::DealSourcing => NodeConfig::Lifecycle(LifecycleConfig::DealSourcing {
                sectors: "fintech,healthtech".to_string(),
                min_revenue: "$10M".to_string(),
                geography: "North America".to_string(),
            }),
            NodeKind::Screening => NodeConfig::Lifecycle(LifecycleConfig::Screening {
                criteria: "growth,margins,market size".to_string(),
                pass_threshold: 0.7,
            }),
            NodeKind::DueDiligence => NodeConfig::Lifecycle(LifecycleConfig::DueDiligence {
                diligence_areas: "financial,legal,operational,market".to_string(),
                depth: "standard".to_string(),
            }),
            NodeKind::ValuationModeling => {
                NodeConfig::Lifecycle(LifecycleConfig::ValuationModeling {
                    valuation_methods: "DCF,comparables,multiples".to_string(),
                    discount_rate: "10%".to_string(),
                })
            }
            NodeKind::InvestmentCommittee => {
                NodeConfig::Lifecycle(LifecycleConfig::InvestmentCommittee {
                    quorum: 3,
                    voting_rule: "majority".to_string(),
                })
            }
            NodeKind::PortfolioMonitoring => {
                NodeConfig::Lifecycle(LifecycleConfig::PortfolioMonitoring {
                    kpis: "revenue,EBITDA,cash runway".to_string(),
                    review_cadence: "quarterly".to_string(),
                })
            }
            NodeKind::ExitPlanning => NodeConfig::Lifecycle(LifecycleConfig::ExitPlanning {
                exit_options: "IPO,strategic sale,secondary".to_string(),
                target_horizon: "5 years".to_string(),
            }),
            NodeKind::Alert => NodeConfig::Alert(AlertConfig {
                channel: "email".to_string(),
                threshold: 5.0,
                severity: "medium".to_string(),
            }),
            NodeKind::Output => NodeConfig::Output(OutputConfig {
                format: "json".to_string(),
                destination: "dashboard".to_string(),
            }),
            NodeKind::Report => NodeConfig::Output(OutputConfig {
                format: "pdf".to_string(),
                destination: "email".to_string(),
            }),
        }
    }

    /// Flatten into the key/value pairs stored in `NodeData`
    pub fn into_fields(self) -> Vec<(&'static str, DataValue)> {
        match self {
            NodeConfig::Trigger(c) => vec![
                ("schedule", text(&c.schedule)),
                ("timezone", text(&c.timezone)),
            ],
            NodeConfig::Orchestrator(c) => vec![
                ("model", text(&c.model)),
                ("strategy", text(&c.strategy)),
                ("maxParallel", c.max_parallel.into()),
            ],
            NodeConfig::DataSource(c) => vec![
                ("source", text(&c.source)),
                ("interval", text(&c.interval)),
                ("symbol", text(&c.symbol)),
            ],
            NodeConfig::Analysis(c) => vec![
                ("model", text(&c.model)),
                ("indicators", text(&c.indicators)),
                ("confidenceThreshold", c.confidence_threshold.into()),
            ],
            NodeConfig::Alert(c) => vec![
                ("channel", text(&c.channel)),
                ("threshold", c.threshold.into()),
                ("severity", text(&c.severity)),
            ],
            NodeConfig::Output(c) => vec![
                ("format", text(&c.format)),
                ("destination", text(&c.destination)),
            ],
            NodeConfig::Lifecycle(stage) => match stage {
                LifecycleConfig::DealSourcing { sectors, min_revenue, geography } => vec![
                    ("sectors", sectors.into()),
                    ("minRevenue", min_revenue.into()),
                    ("geography", geography.into()),
                ],
                LifecycleConfig::Screening { criteria, pass_threshold } => vec![
                    ("criteria", criteria.into()),
                    ("passThreshold", pass_threshold.into()),
                ],
                LifecycleConfig::DueDiligence { diligence_areas, depth } => vec![
                    ("diligenceAreas", diligence_areas.into()),
                    ("depth", depth.into()),
                ],
                LifecycleConfig::ValuationModeling { valuation_methods, discount_rate } => vec![
                    ("valuationMethods", valuation_methods.into()),
                    ("discountRate", discount_rate.into()),
                ],
                LifecycleConfig::InvestmentCommittee { quorum, voting_rule } => vec![
                    ("quorum", quorum.into()),
                    ("votingRule", voting_rule.into()),
                ],
                LifecycleConfig::PortfolioMonitoring { kpis, review_cadence } => vec![
                    ("kpis", kpis.into()),
                    ("reviewCadence", review_cadence.into()),
                ],
                LifecycleConfig::ExitPlanning { exit_options, target_horizon } => vec![
                    ("exitOptions", exit_options.into()),
                    ("targetHorizon", target_horizon.into()),
                ],
            },
        }
    }
}

/// Default `data` for a known kind
pub fn defaults_for(kind: NodeKind) -> NodeData {
    NodeConfig::for_kind(kind)
        .into_fields()
        .into_iter()
        .fold(NodeData::new(entry(kind).label), |data, (key, value)| {
            data.with(key, value)
        })
}

/// Default `data` for any node type
///
/// Unrecognized types get only a label, derived by capitalizing the type
/// name.
pub fn resolve_defaults(node_type: &NodeType) -> NodeData {
    match node_type {
        NodeType::Known(kind) => defaults_for(*kind),
        NodeType::Unrecognized(name) => {
            log::debug!("No catalog entry for node type '{}', using bare label", name);
            NodeData::new(fallback_label(name))
        }
    }
}

fn fallback_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Node".to_string(),
    }
}

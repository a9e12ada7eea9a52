//! End-to-end portfolio analysis.
//!
//! Stages: fetch holdings, fetch price history per held asset, score risk,
//! correlate returns, then compare the current split against the target
//! allocation for the requested risk profile.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use super::allocation::{
    current_allocation, rebalancing_actions, suggest_allocation, Allocation, RiskProfile,
};
use super::correlation::{correlation_matrix, CorrelationMatrix};
use super::error::AstraportError;
use super::price_series::PriceSeries;
use super::risk::{score_portfolio_risk, PortfolioSnapshot, RiskAssessment, RiskPolicy};
use crate::ports::data_port::DataPort;
use crate::ports::event_port::EventPort;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub wallet: String,
    pub profile: RiskProfile,
    pub stable_assets: HashSet<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AnalysisRequest {
    /// Request over the full available history with no stable assets.
    pub fn new(wallet: impl Into<String>, profile: RiskProfile) -> Self {
        Self {
            wallet: wallet.into(),
            profile,
            stable_assets: HashSet::new(),
            start_date: NaiveDate::MIN,
            end_date: NaiveDate::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PortfolioAnalysis {
    pub wallet: String,
    pub profile: RiskProfile,
    pub risk: RiskAssessment,
    pub target_allocation: Allocation,
    pub current_allocation: BTreeMap<String, f64>,
    pub rebalancing_actions: BTreeMap<String, f64>,
    pub correlation: CorrelationMatrix,
}

/// Materialises holdings and price history for `request.wallet`.
///
/// A failed price fetch is recorded in [`PortfolioSnapshot::unavailable`] so
/// the risk policy decides whether it is fatal.
pub fn build_snapshot(
    data: &dyn DataPort,
    request: &AnalysisRequest,
) -> Result<PortfolioSnapshot, AstraportError> {
    let holdings = data.fetch_holdings(&request.wallet)?;
    let mut snapshot = PortfolioSnapshot::new(holdings);

    let assets: Vec<String> = snapshot.holdings.assets().map(str::to_string).collect();
    for asset in assets {
        match data.fetch_prices(&asset, request.start_date, request.end_date) {
            Ok(points) => {
                snapshot
                    .price_history
                    .insert(asset, PriceSeries::from_points(points));
            }
            Err(e) => {
                snapshot.unavailable.insert(asset, e.to_string());
            }
        }
    }

    Ok(snapshot)
}

pub fn analyze_portfolio(
    data: &dyn DataPort,
    request: &AnalysisRequest,
    policy: &RiskPolicy,
    events: &dyn EventPort,
) -> Result<PortfolioAnalysis, AstraportError> {
    let snapshot = build_snapshot(data, request)?;
    analyze_snapshot(&snapshot, request, policy, events)
}

/// Runs every analysis stage after data collection.
pub fn analyze_snapshot(
    snapshot: &PortfolioSnapshot,
    request: &AnalysisRequest,
    policy: &RiskPolicy,
    events: &dyn EventPort,
) -> Result<PortfolioAnalysis, AstraportError> {
    let risk = score_portfolio_risk(snapshot, policy, events)?;

    let usable: BTreeMap<String, PriceSeries> = risk
        .contributions
        .iter()
        .filter_map(|c| {
            snapshot
                .price_history
                .get(&c.asset)
                .map(|s| (c.asset.clone(), s.clone()))
        })
        .collect();
    let correlation = correlation_matrix(&usable)?;

    let target_allocation = suggest_allocation(request.profile);
    let current = current_allocation(&snapshot.holdings, &request.stable_assets);
    let actions = rebalancing_actions(&current, &target_allocation.as_weights());

    Ok(PortfolioAnalysis {
        wallet: request.wallet.clone(),
        profile: request.profile,
        risk,
        target_allocation,
        current_allocation: current,
        rebalancing_actions: actions,
        correlation,
    })
}

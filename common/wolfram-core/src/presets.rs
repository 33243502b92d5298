//! Parameter presets shared by the facades

use crate::params::QueryParams;

pub const STEP_BY_STEP_PODSTATE: &str = "Solution__Step-by-step solution";

/// Second attempt when the first full query comes back with zero pods
pub fn fallback_retry() -> QueryParams {
    QueryParams::new()
        .with("podtimeout", 15i64)
        .with("scantimeout", 10i64)
        .with("format", "plaintext")
        .with("reinterpret", true)
        .with("translation", true)
}

/// Only the primary result pod
pub fn simple() -> QueryParams {
    QueryParams::new().with("includepodid", "Result")
}

/// Math route: results, solutions and plots with step-by-step expanded
pub fn math() -> QueryParams {
    QueryParams::new()
        .with("includepodid", "Result,Solution,Plot")
        .with("podstate", STEP_BY_STEP_PODSTATE)
}

/// Math tool without plot pods
pub fn math_plotless() -> QueryParams {
    QueryParams::new().with("excludepodid", "Plot")
}

pub fn science(include_visualization: bool) -> QueryParams {
    let pods = if include_visualization {
        "Result,Properties,Structure,Visualization"
    } else {
        "Result,Properties"
    };
    QueryParams::new().with("includepodid", pods)
}

pub fn step_by_step() -> QueryParams {
    QueryParams::new()
        .with("podstate", STEP_BY_STEP_PODSTATE)
        .with("includepodid", "Solution")
}

pub fn plot(width: u32) -> QueryParams {
    QueryParams::new()
        .with("includepodid", "Plot")
        .with("width", width)
        .with("plotwidth", width)
}

pub mod loaders;

pub use loaders::*;

use std::path::Path;

use rd_types::{FxTable, Position, RdResult};

/// Positions and FX rates for a single report run
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub positions: Vec<Position>,
    pub fx_rates: FxTable,
}

impl ReportInputs {
    /// Load both input tables. The positions file is read first, so a run with
    /// two bad paths reports the positions path.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(positions_path: P, fx_path: Q) -> RdResult<Self> {
        let loader = CsvLoader::new();
        let positions = loader.load_positions(positions_path)?;
        let fx_rates = loader.load_fx_rates(fx_path)?;

        Ok(Self { positions, fx_rates })
    }
}

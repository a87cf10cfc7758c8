pub mod cfads;

pub use cfads::{
    build_annual_rows, build_annual_rows_with_interest, operating_cfads, AnnualCashflowRow,
    CfadsInput, CfadsOutput, StatutoryDeductions, TariffAndOpex,
};

pub mod analysis;
pub mod investment;

pub use analysis::{analyze_profile, ProfileAnalysis};
pub use investment::{
    AcquisitionCosts, FinancingKind, FinancingParameters, InvestmentProfile, LoanTerms,
    OperatingParameters, DEFAULT_LOAN_TERM_YEARS, MAX_LOAN_TERM_YEARS,
};

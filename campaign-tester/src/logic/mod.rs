pub mod campaign;
pub mod checks;
pub mod playthrough;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use campaign::BUNDLED_CAMPAIGN;
pub use checks::{CampaignCheck, catalog_checks, find_check};
pub use playthrough::{CampaignSimulator, PlayStrategy};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::{CheckResult, LogicTester};

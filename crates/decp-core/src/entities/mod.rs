//! Entity structs for the persisted DECP model.
//!
//! Each entity maps to a table (or a parent table plus child tables) in the
//! libSQL database. All structs derive `Serialize`, `Deserialize`, and
//! `JsonSchema` for JSON output and schema validation.
//!
//! `uid` fields are store-side surrogate keys; `id` fields are the identifiers
//! carried by the feed.

mod concession;
mod contract;
mod financials;
mod malformed;
mod organization;
mod place;

pub use concession::{Concession, ConcessionAmendment, ExecutionData, Tariff};
pub use contract::{Contract, ContractAmendment, SubcontractingAct, SubcontractingAmendment};
pub use financials::OrganizationFinancials;
pub use malformed::{MalformedRecord, RecordError};
pub use organization::Organization;
pub use place::Place;

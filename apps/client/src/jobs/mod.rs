// Job lifecycle controllers: submit, observe, page through and delete analyses.
// All backend access goes through api_client::AnalysisApi; JobStore is the only shared state.

pub mod clock;
pub mod deletion;
pub mod history;
pub mod poller;
pub mod store;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::TokioClock;
pub use deletion::DeletionCoordinator;
pub use history::HistoryPaginator;
pub use poller::{PollConfig, ResultPoller};
pub use store::JobStore;
pub use submitter::JobSubmitter;

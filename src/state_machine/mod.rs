// State machines for match records and calculation jobs
//
// Match status transitions gate what editors may do with a fixture; job
// status transitions keep the queue's bookkeeping honest and let retries be
// inspected mid-flight instead of hiding inside recursive calls.

pub mod states;
pub mod transitions;

pub use states::{JobStatus, MatchStatus};
pub use transitions::{allowed_match_transitions, is_valid_match_transition};

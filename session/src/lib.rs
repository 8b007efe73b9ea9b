pub mod answers;
pub mod attempt;
pub mod error;
pub mod quiz;
pub mod report;
pub mod scoring;
pub mod session;
pub mod submission;

pub use answers::{AnswerSheet, ClozeKey, QuestionIndex, VocabKey};
pub use attempt::{Attempt, Part};
pub use error::SessionError;
pub use quiz::{Checked, Quiz};
pub use report::{Receipt, Respondent, ScoreReport};
pub use scoring::{Feedback, Scores, Tally};
pub use session::{Phase, Progress, Recorded, Session};
pub use submission::{
    Dispatch, LoopbackTransport, Resolution, Skip, Submission, SubmissionCoordinator,
    SubmissionFailure, SubmissionStatus, Ticket, Transport, TransportError, Trigger,
};

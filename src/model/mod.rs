//! Record types fetched from the chapter service, as already-deserialized
//! values. Field names mirror the service's camelCase wire shapes.

mod attendance;
mod candidate;
mod event;
mod id;
mod member;
mod session;
mod vote;

pub use attendance::{Attendance, AttendanceBatch, AttendanceKey, AttendanceRecords, Excuse};
pub use candidate::{Candidate, ClassYear};
pub use event::Event;
pub use id::{serde_string_map, CandidateId, Email, EventId, Id, SessionId};
pub use member::Member;
pub use session::{Session, SessionType};
pub use vote::Vote;

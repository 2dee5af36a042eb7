pub mod catalog;
pub mod check_in;
pub mod segment;
pub mod setting;
pub mod task;
pub mod timer;

pub use catalog::{Category, Collection, Metric, SubtaskTemplate, TaskCollection, TaskTemplate};
pub use check_in::CheckIn;
pub use segment::Segment;
pub use setting::Setting;
pub use task::{EntryStatus, Subtask, SubtaskEntry, Task, TaskEntry, TaskStatus, TaskType};
pub use timer::TimerSession;

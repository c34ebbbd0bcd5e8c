//! Scheduled tasks: records, persistence, and lifecycle forwarding to the
//! scheduler over the bus.

pub mod bus;
pub mod forwarder;
pub mod model;
pub mod repo;
pub mod sqlite;

pub use bus::{BusClient, StopTaskRequest, TcpBusClient};
pub use forwarder::{DeleteOutcome, TaskForwarder};
pub use model::{NewTask, Task};
pub use repo::TaskRepository;
pub use sqlite::SqliteTaskRepository;

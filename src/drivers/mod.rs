mod http;

pub use self::http::{request_headers, HttpTransport};
pub use self::in_memory_test::{InMemoryTestResponseBuilder, InMemoryTestTransport, RecordedBatch};

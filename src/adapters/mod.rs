//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements   | Connects to                    |
//! |--------------|--------------|--------------------------------|
//! | `cache_file` | CacheStore   | JSON file on local disk        |
//! | `console`    | Transport    | stdin / stdout topic lines     |
//! |              | EventSink    | outbox topic                   |
//! | `gpio`       | OutputPort   | simulated lines, embedded-hal  |
//! | `log_sink`   | EventSink    | log output                     |
//! | `time`       | ClockPort    | host system clock              |

pub mod cache_file;
pub mod console;
pub mod gpio;
pub mod log_sink;
pub mod time;

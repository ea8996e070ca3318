//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter    | Implements | Connects to                    |
//! |------------|------------|--------------------------------|
//! | `wifi`     | WifiPort   | ESP-IDF WiFi STA/AP            |
//! | `nvs`      | ConfigPort | NVS / in-memory store          |
//! | `log_sink` | EventSink  | Serial log output              |
//! | `time`     | —          | ESP32 system timer / `Instant` |

pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
